//! Job postings table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crewcache_core::models::PostingStatus;

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_date, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.postings.view(&app.postings_view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let header = Row::new([
        Cell::from("Title"),
        Cell::from("Department"),
        Cell::from("Location"),
        Cell::from("Type"),
        Cell::from("Status"),
        Cell::from("Posted"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|posting| {
            let status_style = match posting.status {
                PostingStatus::Open => styles::success_style(),
                PostingStatus::Closed => styles::muted_style(),
            };

            Row::new([
                Cell::from(truncate(&posting.title, 30)),
                Cell::from(
                    posting
                        .department
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(
                    posting
                        .location
                        .clone()
                        .unwrap_or_else(|| "Remote".to_string()),
                ),
                Cell::from(
                    posting
                        .employment_type
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(Span::styled(posting.status.label(), status_style)),
                Cell::from(format_date(&posting.created_at)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(28),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(13),
    ];

    let title = format!(
        " Postings ({}) - [x] open/close [d]elete ",
        app.postings.len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !page.items.is_empty() {
        state.select(Some(app.selection(Tab::Postings)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(
        Paragraph::new(footer_text(&page, &app.postings_view)).style(styles::muted_style()),
        chunks[1],
    );
}

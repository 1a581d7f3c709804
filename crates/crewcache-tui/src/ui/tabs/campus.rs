//! Campus recruitment applications table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::applications::status_style;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_date, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.campus.view(&app.campus_view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let header = Row::new([
        Cell::from("Candidate"),
        Cell::from("Email"),
        Cell::from("College"),
        Cell::from("Degree"),
        Cell::from("Year"),
        Cell::from("Status"),
        Cell::from("Applied"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|application| {
            Row::new([
                Cell::from(truncate(&application.name, 22)),
                Cell::from(truncate(&application.email, 26)),
                Cell::from(
                    application
                        .college
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(
                    application
                        .degree
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(
                    application
                        .graduation_year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(Span::styled(
                    application.status.label(),
                    status_style(application.status),
                )),
                Cell::from(format_date(&application.created_at)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(22),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Length(13),
    ];

    let title = format!(
        " Campus ({}) - [n] advance [j] reject ",
        app.campus.len()
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
        state.select(Some(app.selection(Tab::Campus)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(
        Paragraph::new(footer_text(&page, &app.campus_view)).style(styles::muted_style()),
        chunks[1],
    );
}

//! Direct job applications table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crewcache_core::models::ApplicationStatus;

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_date, format_phone, truncate};

pub(crate) fn status_style(status: ApplicationStatus) -> ratatui::style::Style {
    match status {
        ApplicationStatus::Applied => styles::list_item_style(),
        ApplicationStatus::Shortlisted => styles::highlight_style(),
        ApplicationStatus::Interview => styles::search_style(),
        ApplicationStatus::Selected => styles::success_style(),
        ApplicationStatus::Rejected => styles::error_style(),
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.applications.view(&app.applications_view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let header = Row::new([
        Cell::from("Candidate"),
        Cell::from("Email"),
        Cell::from("Position"),
        Cell::from("Phone"),
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
                Cell::from(truncate(&application.name, 24)),
                Cell::from(truncate(&application.email, 28)),
                Cell::from(
                    application
                        .job_title
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(
                    application
                        .phone
                        .as_deref()
                        .map(format_phone)
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
        Constraint::Percentage(20),
        Constraint::Percentage(24),
        Constraint::Fill(1),
        Constraint::Length(15),
        Constraint::Length(12),
        Constraint::Length(13),
    ];

    let title = format!(
        " Applications ({}) - [n] advance [j] reject ",
        app.applications.len()
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
        state.select(Some(app.selection(Tab::Applications)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(
        Paragraph::new(footer_text(&page, &app.applications_view)).style(styles::muted_style()),
        chunks[1],
    );
}

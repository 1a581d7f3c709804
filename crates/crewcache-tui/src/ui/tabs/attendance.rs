//! Attendance table with the auto-absent sweep action.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use chrono::{DateTime, Utc};

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_hours, truncate};

fn format_time(instant: &Option<DateTime<Utc>>) -> String {
    instant
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.attendance.view(&app.attendance_view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let header = Row::new([
        Cell::from("Employee"),
        Cell::from("Code"),
        Cell::from("Date"),
        Cell::from("In"),
        Cell::from("Out"),
        Cell::from("Hours"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|record| {
            let name = record
                .employee_name
                .clone()
                .unwrap_or_else(|| record.user_id.clone());
            let status = if record.is_present {
                Span::styled(record.status_label(), styles::success_style())
            } else {
                Span::styled(record.status_label(), styles::error_style())
            };

            Row::new([
                Cell::from(truncate(&name, 26)),
                Cell::from(
                    record
                        .employee_code
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(record.date.to_string()),
                Cell::from(format_time(&record.check_in)),
                Cell::from(format_time(&record.check_out)),
                Cell::from(format_hours(record.total_hours)),
                Cell::from(status),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(8),
    ];

    let title = format!(
        " Attendance ({}) - [m] mark absentees for yesterday ",
        app.attendance.len()
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
        state.select(Some(app.selection(Tab::Attendance)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(
        Paragraph::new(footer_text(&page, &app.attendance_view)).style(styles::muted_style()),
        chunks[1],
    );
}

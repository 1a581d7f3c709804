//! Staff roster tables: admins, employees, and HR share one renderer.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_date, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect, tab: Tab) {
    let (cache, view) = match tab {
        Tab::Admins => (&app.admins, &app.admins_view),
        Tab::Employees => (&app.employees, &app.employees_view),
        Tab::Hr => (&app.hr, &app.hr_view),
        _ => return,
    };
    let page = cache.view(view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Stats line
            Constraint::Min(5),    // Table
            Constraint::Length(1), // Footer
        ])
        .split(area);

    // Stats line
    if let Some(stats) = app.stats_for(tab) {
        let line = Line::from(vec![
            Span::styled(" Total ", styles::muted_style()),
            Span::styled(stats.total.to_string(), styles::highlight_style()),
            Span::styled("   Active ", styles::muted_style()),
            Span::styled(stats.active.to_string(), styles::success_style()),
            Span::styled("   Inactive ", styles::muted_style()),
            Span::styled(stats.inactive.to_string(), styles::error_style()),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[0]);
    }

    // Table
    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Email"),
        Cell::from("Code"),
        Cell::from("Department"),
        Cell::from("Status"),
        Cell::from("Created"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|user| {
            let status_style = if user.is_active {
                styles::success_style()
            } else {
                styles::error_style()
            };

            Row::new([
                Cell::from(truncate(&user.name, 24)),
                Cell::from(truncate(&user.email, 30)),
                Cell::from(user.employee_code.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(
                    user.department
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(Span::styled(user.status_label(), status_style)),
                Cell::from(format_date(&user.created_at)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(28),
        Constraint::Length(8),
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(13),
    ];

    let title = format!(
        " {} ({}) - [a]dd [x] toggle active [d]elete ",
        tab.title(),
        cache.len()
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
        state.select(Some(app.selection(tab)));
    }
    frame.render_stateful_widget(table, chunks[1], &mut state);

    // Footer
    frame.render_widget(
        Paragraph::new(footer_text(&page, view)).style(styles::muted_style()),
        chunks[2],
    );
}

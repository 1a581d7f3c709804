//! Project budget table (read-only).

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Tab};
use crate::ui::styles;
use crate::ui::tabs::footer_text;
use crate::utils::format::{format_money, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.budgets.view(&app.budgets_view);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let header = Row::new([
        Cell::from("Project"),
        Cell::from("Department"),
        Cell::from("Allocated"),
        Cell::from("Spent"),
        Cell::from("Remaining"),
        Cell::from("Used"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|budget| {
            let remaining_style = if budget.is_over_budget() {
                styles::error_style()
            } else {
                styles::success_style()
            };

            Row::new([
                Cell::from(truncate(&budget.project_name, 28)),
                Cell::from(
                    budget
                        .department
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(format_money(budget.allocated)),
                Cell::from(format_money(budget.spent)),
                Cell::from(Span::styled(
                    format_money(budget.remaining()),
                    remaining_style,
                )),
                Cell::from(format!("{:.0}%", budget.utilization_pct())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(26),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(6),
    ];

    let title = format!(" Budgets ({}) ", app.budgets.len());

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
        state.select(Some(app.selection(Tab::Budgets)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(
        Paragraph::new(footer_text(&page, &app.budgets_view)).style(styles::muted_style()),
        chunks[1],
    );
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Tab, UserFormFocus};

use super::styles;
use super::tabs::{applications, attendance, budgets, campus, postings, users};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::AddingUser => render_user_form_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  crewcache - {}", app.config.company());
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + help_hint.len() + 2),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::all().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Admins | Tab::Employees | Tab::Hr => {
            users::render(frame, app, area, app.current_tab)
        }
        Tab::Postings => postings::render(frame, app, area),
        Tab::Applications => applications::render(frame, app, area),
        Tab::Campus => campus::render(frame, app, area),
        Tab::Attendance => attendance::render(frame, app, area),
        Tab::Budgets => budgets::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/] search [f]ilter [r]efresh [q]uit";

    // Warn once the session is close to expiry so the operator can sign
    // in again before writes start failing
    let expiring = app
        .session
        .data
        .as_ref()
        .filter(|d| d.needs_refresh() && !d.is_expired())
        .map(|d| d.minutes_until_expiry());

    let left_text = if matches!(app.state, AppState::Searching) {
        format!(
            " Search: {}▌  (Enter to keep, Esc to clear) ",
            app.view(app.current_tab).search
        )
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(minutes) = expiring {
        format!(" Session expires in {}m - [o] to sign in again ", minutes)
    } else {
        format!(" Updated {} ", app.cache_ages.last_updated())
    };

    let left_style = if matches!(app.state, AppState::Searching) {
        styles::search_style()
    } else {
        styles::muted_style()
    };

    let right_text = format!(" {} ", shortcuts);
    let padding = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 26, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  crewcache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("1-8", "Switch tabs"),
        key("<-/->", "Prev/next tab"),
        key("Up/Down", "Navigate rows"),
        key("[ / ]", "Prev/next page"),
        key("s", "Cycle page size"),
        Line::from(""),
        Line::from(Span::styled(" Listing", styles::highlight_style())),
        key("/", "Search name/email/id"),
        key("f", "Cycle status filter"),
        key("c", "Clear search and filters"),
        key("r", "Refresh current tab"),
        key("R", "Refresh everything"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("a", "Add account (staff tabs)"),
        key("x", "Toggle active / open-close"),
        key("d", "Delete (with confirmation)"),
        key("n / j", "Advance / reject application"),
        key("m", "Mark yesterday's absentees"),
        key("o", "Sign out"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("      crewcache", styles::title_style())),
        Line::from(Span::styled(
            "      sign in to the workforce platform",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    let field = |label: &'static str, value: String, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{} [", label), styles::muted_style()),
            Span::styled(format!("{:<24}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    lines.push(field(
        "Email:   ",
        app.login_username.clone(),
        app.login_focus == LoginFocus::Username,
    ));
    lines.push(field(
        "Password:",
        "*".repeat(app.login_password.len().min(24)),
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused {
        " ▶ Sign in ◀ "
    } else {
        "   Sign in   "
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_user_form_overlay(frame: &mut Frame, app: &App) {
    let height = if app.form_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("   New {} account", app.form_role.title()),
            styles::title_style(),
        )),
        Line::from(Span::styled(
            "   code and welcome mail are generated on save",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    let field = |label: &'static str, value: String, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{} [", label), styles::muted_style()),
            Span::styled(format!("{:<30}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    lines.push(field(
        "Name: ",
        app.form_name.clone(),
        app.form_focus == UserFormFocus::Name,
    ));
    lines.push(field(
        "Email:",
        app.form_email.clone(),
        app.form_focus == UserFormFocus::Email,
    ));

    let role_focused = app.form_focus == UserFormFocus::Role;
    let role_style = if role_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Role:  ", styles::muted_style()),
        Span::styled(format!("◀ {} ▶", app.form_role.title()), role_style),
        Span::styled("  (Space to change)", styles::muted_style()),
    ]));

    lines.push(Line::from(""));
    let button_focused = app.form_focus == UserFormFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused {
        " ▶ Create ◀ "
    } else {
        "   Create   "
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button_label, button_style),
        Span::raw("]  Esc cancels"),
    ]));

    if let Some(ref error) = app.form_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 8, frame.area());
    frame.render_widget(Clear, area);

    let label = app
        .pending_delete
        .as_ref()
        .map(|p| p.label.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled("   Delete", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            format!("   Permanently delete \"{}\"?", label),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 8, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled("   crewcache", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

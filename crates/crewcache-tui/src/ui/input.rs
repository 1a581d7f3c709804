//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Mutations are
//! awaited here before control returns to the event loop, so the listing
//! on screen always reflects the write that just happened.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_field_char, can_add_password_char, can_add_username_char, App, AppState, LoginFocus,
    Tab, UserFormFocus,
};
use crewcache_core::models::Role;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle new-account form
    if matches!(app.state, AppState::AddingUser) {
        return handle_user_form_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_delete().await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.pending_delete = None;
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        return handle_search_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char(c @ '1'..='8') => {
            let idx = (c as usize) - ('1' as usize);
            app.current_tab = Tab::all()[idx];
            app.maybe_load_current_tab().await;
        }
        KeyCode::Right | KeyCode::Tab => {
            app.current_tab = app.current_tab.next();
            app.maybe_load_current_tab().await;
        }
        KeyCode::Left => {
            app.current_tab = app.current_tab.prev();
            app.maybe_load_current_tab().await;
        }
        KeyCode::Up => {
            let tab = app.current_tab;
            let sel = app.selection_mut(tab);
            *sel = sel.saturating_sub(1);
        }
        KeyCode::Down => {
            let tab = app.current_tab;
            let (_, page_len) = app.page_shape(tab);
            let sel = app.selection_mut(tab);
            *sel = (*sel + 1).min(page_len.saturating_sub(1));
        }
        KeyCode::Char('[') => {
            let tab = app.current_tab;
            app.view_mut(tab).prev_page();
            *app.selection_mut(tab) = 0;
        }
        KeyCode::Char(']') => {
            let tab = app.current_tab;
            let (total, _) = app.page_shape(tab);
            app.view_mut(tab).next_page(total);
            *app.selection_mut(tab) = 0;
        }
        KeyCode::Char('s') => {
            let tab = app.current_tab;
            app.view_mut(tab).cycle_page_size();
            *app.selection_mut(tab) = 0;
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Char('c') => {
            let tab = app.current_tab;
            if app.view(tab).is_filtered() {
                app.view_mut(tab).clear();
                app.clamp_selection(tab);
            }
        }
        KeyCode::Char('f') => {
            app.cycle_status_filter();
        }
        KeyCode::Char('r') => {
            let tab = app.current_tab;
            app.invalidate_tab(tab);
            app.maybe_load_current_tab().await;
        }
        KeyCode::Char('R') => {
            app.refresh_all_background();
        }
        KeyCode::Char('o') => {
            app.logout();
        }
        KeyCode::Char('a') => {
            if app.current_tab.role().is_some() {
                app.start_add_user();
            }
        }
        KeyCode::Char('x') => match app.current_tab {
            Tab::Admins | Tab::Employees | Tab::Hr => app.toggle_selected_active().await,
            Tab::Postings => app.toggle_selected_posting().await,
            _ => {}
        },
        KeyCode::Char('d') => {
            app.request_delete();
        }
        KeyCode::Char('n') => {
            app.set_selected_application_status(false).await;
        }
        KeyCode::Char('j') => {
            app.set_selected_application_status(true).await;
        }
        KeyCode::Char('m') => {
            if app.current_tab == Tab::Attendance {
                app.run_auto_absent().await;
            }
        }
        _ => {}
    }

    Ok(false)
}

/// Search input: every keystroke re-derives the page from the cached
/// snapshot; nothing hits the network here.
fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    let tab = app.current_tab;

    match key.code {
        KeyCode::Esc => {
            app.view_mut(tab).set_search("");
            app.clamp_selection(tab);
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.view_mut(tab).pop_search_char();
            app.clamp_selection(tab);
        }
        KeyCode::Char(c) => {
            let len = app.view(tab).search.len();
            if can_add_field_char(len, c) {
                app.view_mut(tab).push_search_char(c);
                app.clamp_selection(tab);
            }
        }
        _ => {}
    }

    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            if app.is_authenticated() {
                app.state = AppState::Normal;
            } else {
                app.state = AppState::ConfirmingQuit;
            }
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // Errors surface in the overlay; stay on the form
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.len(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }

    Ok(false)
}

fn cycle_form_role(role: Role) -> Role {
    match role {
        Role::Admin => Role::Hr,
        Role::Hr => Role::Employee,
        Role::Employee | Role::SuperAdmin => Role::Admin,
    }
}

async fn handle_user_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.form_focus = match app.form_focus {
                UserFormFocus::Name => UserFormFocus::Email,
                UserFormFocus::Email => UserFormFocus::Role,
                UserFormFocus::Role => UserFormFocus::Button,
                UserFormFocus::Button => UserFormFocus::Name,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.form_focus = match app.form_focus {
                UserFormFocus::Name => UserFormFocus::Button,
                UserFormFocus::Email => UserFormFocus::Name,
                UserFormFocus::Role => UserFormFocus::Email,
                UserFormFocus::Button => UserFormFocus::Role,
            };
        }
        KeyCode::Enter => match app.form_focus {
            UserFormFocus::Name => app.form_focus = UserFormFocus::Email,
            UserFormFocus::Email => app.form_focus = UserFormFocus::Role,
            UserFormFocus::Role | UserFormFocus::Button => {
                app.submit_new_user().await;
            }
        },
        KeyCode::Left | KeyCode::Right => {
            if app.form_focus == UserFormFocus::Role {
                app.form_role = cycle_form_role(app.form_role);
            }
        }
        KeyCode::Backspace => match app.form_focus {
            UserFormFocus::Name => {
                app.form_name.pop();
            }
            UserFormFocus::Email => {
                app.form_email.pop();
            }
            _ => {}
        },
        KeyCode::Char(' ') if app.form_focus == UserFormFocus::Role => {
            app.form_role = cycle_form_role(app.form_role);
        }
        KeyCode::Char(c) => match app.form_focus {
            UserFormFocus::Name => {
                if can_add_field_char(app.form_name.len(), c) {
                    app.form_name.push(c);
                }
            }
            UserFormFocus::Email => {
                if can_add_field_char(app.form_email.len(), c) {
                    app.form_email.push(c);
                }
            }
            _ => {}
        },
        _ => {}
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_form_role_never_yields_superadmin() {
        let mut role = Role::Admin;
        for _ in 0..6 {
            role = cycle_form_role(role);
            assert_ne!(role, Role::SuperAdmin);
        }
        assert_eq!(cycle_form_role(Role::SuperAdmin), Role::Admin);
    }
}

use crossterm::event::KeyCode;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rusqlite::Connection;

use crate::form::{FormInput, LogForm, Modal, Submission, SubmitOutcome};
use crate::models::ActivityLog;
use crate::store::{self, Table};
use crate::tui::{
    draw_chrome, form_lines, scroll_offset, title_line, wrap_text, PageAction, StatusLine,
    FORM_HINTS,
};

enum Screen {
    List,
    ConfirmDelete,
}

pub struct LogManager {
    logs: Vec<ActivityLog>,
    selection: usize,
    screen: Screen,
    modal: Modal<LogForm>,
    status: StatusLine,
    greeting: String,
}

impl LogManager {
    pub fn new(conn: &Connection, greeting: &str) -> Self {
        let mut manager = Self {
            logs: Vec::new(),
            selection: 0,
            screen: Screen::List,
            modal: Modal::default(),
            status: StatusLine::default(),
            greeting: greeting.to_string(),
        };
        manager.reload(conn);
        manager
    }

    fn reload(&mut self, conn: &Connection) {
        match store::list_logs(conn) {
            Ok(logs) => self.logs = logs,
            Err(e) => {
                tracing::error!(error = %e, "could not load activity log");
                self.status.set(format!("Could not load activity log: {e}"));
            }
        }
        if self.logs.is_empty() {
            self.selection = 0;
        } else {
            self.selection = self.selection.min(self.logs.len() - 1);
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        if let Some(f) = self.modal.form() {
            let content = draw_chrome(frame, &self.greeting, FORM_HINTS, None);
            frame.render_widget(
                Paragraph::new(form_lines("Log Activity", &f.form, self.status.get())),
                content,
            );
            return;
        }

        let footer = match self.screen {
            Screen::List => "a=add  d=delete  Up/Down=select  Esc=back",
            Screen::ConfirmDelete => "y=confirm  n=cancel",
        };
        let content = draw_chrome(frame, &self.greeting, footer, self.status.get());
        let text_width = (content.width as usize).saturating_sub(24);

        let mut lines = vec![Line::from(""), title_line("Activity Log"), Line::from("")];
        let mut selected_line = 0;
        if self.logs.is_empty() {
            lines.push(Line::from("   Nothing logged yet. Press 'a' to add an entry."));
        }
        for (i, log) in self.logs.iter().enumerate() {
            let is_selected = i == self.selection;
            if is_selected {
                selected_line = lines.len();
            }
            let marker = if is_selected { " > " } else { "   " };
            let style = if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let (wrapped, _) = wrap_text(&log.action, text_width);
            for (n, part) in wrapped.lines().enumerate() {
                let when = if n == 0 {
                    log.created_at.format("%Y-%m-%d %H:%M").to_string()
                } else {
                    String::new()
                };
                lines.push(Line::from(vec![
                    Span::raw(if n == 0 { marker } else { "   " }),
                    Span::styled(format!("{when:<18}"), Style::default().fg(Color::DarkGray)),
                    Span::styled(part.to_string(), style),
                ]));
            }
        }

        if let Screen::ConfirmDelete = self.screen {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "   Delete this entry? (y/n)",
                Style::default().fg(Color::Yellow),
            )));
        }

        let offset = scroll_offset(selected_line, content.height);
        frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), content);
    }

    pub fn handle_key(&mut self, code: KeyCode, conn: &Connection) -> PageAction {
        self.status.tick();

        if self.modal.is_open() {
            let input = match self.modal.form_mut() {
                Some(f) => f.form.handle_key(code),
                None => return PageAction::Continue,
            };
            match input {
                FormInput::Editing => {}
                FormInput::Cancel => self.modal.cancel(),
                FormInput::Submit => {
                    let outcome = self.modal.submit(|s| match s {
                        Submission::Create(action) | Submission::Update { draft: action, .. } => {
                            store::add_log(conn, &action).map(|_| ())
                        }
                    });
                    match outcome {
                        SubmitOutcome::Saved => {
                            self.selection = 0;
                            self.reload(conn);
                            self.status.set("Logged");
                        }
                        SubmitOutcome::Invalid(msg) => self.status.set(msg),
                        SubmitOutcome::Failed(msg) => {
                            self.status.set(format!("Could not save: {msg}"))
                        }
                        SubmitOutcome::Ignored => {}
                    }
                }
            }
            return PageAction::Continue;
        }

        match self.screen {
            Screen::List => match code {
                KeyCode::Up => self.selection = self.selection.saturating_sub(1),
                KeyCode::Down => {
                    if !self.logs.is_empty() {
                        self.selection = (self.selection + 1).min(self.logs.len() - 1);
                    }
                }
                KeyCode::Char('a') => self.modal.open_create(LogForm::new()),
                KeyCode::Char('d') => {
                    if !self.logs.is_empty() {
                        self.screen = Screen::ConfirmDelete;
                    }
                }
                KeyCode::Char('q') | KeyCode::Esc => return PageAction::Close,
                _ => {}
            },
            Screen::ConfirmDelete => match code {
                KeyCode::Char('y') => {
                    if let Some(id) = self.logs.get(self.selection).map(|l| l.id) {
                        match store::delete(conn, Table::ActivityLogs, id) {
                            Ok(()) => {
                                self.reload(conn);
                                self.status.set("Deleted");
                            }
                            Err(e) => self.status.set(e.to_string()),
                        }
                    }
                    self.screen = Screen::List;
                }
                KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::List,
                _ => {}
            },
        }
        PageAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_add_and_delete_entry() {
        let (_dir, conn) = test_db();
        let mut m = LogManager::new(&conn, "hi");

        m.handle_key(KeyCode::Char('a'), &conn);
        for c in "Fed the fish".chars() {
            m.handle_key(KeyCode::Char(c), &conn);
        }
        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.logs.len(), 1);
        assert_eq!(m.logs[0].action, "Fed the fish");

        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('y'), &conn);
        assert!(m.logs.is_empty());
    }

    #[test]
    fn test_blank_entry_is_rejected() {
        let (_dir, conn) = test_db();
        let mut m = LogManager::new(&conn, "hi");
        m.handle_key(KeyCode::Char('a'), &conn);
        m.handle_key(KeyCode::Enter, &conn);
        assert!(m.modal.is_open());
        assert_eq!(m.status.get(), Some("Activity is required"));
    }
}

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rusqlite::Connection;

use crate::fmt::{kilos, money};
use crate::form::{CoprasForm, FormInput, Modal, Submission, SubmitOutcome};
use crate::models::{Area, CoprasRecord, NetSplit};
use crate::reports::{area_summaries, best_area, copras_totals, Metric};
use crate::store::{self, CoprasFilter, CoprasPatch, Table};
use crate::tui::{
    draw_chrome, form_lines, money_span, scroll_offset, title_line, PageAction, StatusLine,
    FORM_HINTS,
};

enum Screen {
    List,
    ConfirmDelete,
}

/// Copra records page: summary cards over a table, with an add/edit modal.
pub struct CoprasManager {
    records: Vec<CoprasRecord>,
    areas: Vec<Area>,
    split: NetSplit,
    selection: usize,
    screen: Screen,
    modal: Modal<CoprasForm>,
    status: StatusLine,
    greeting: String,
}

impl CoprasManager {
    pub fn new(conn: &Connection, greeting: &str, split: NetSplit) -> Self {
        let mut manager = Self {
            records: Vec::new(),
            areas: Vec::new(),
            split,
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
        match store::list_copras(conn, &CoprasFilter::default()) {
            Ok(records) => self.records = records,
            Err(e) => {
                tracing::error!(error = %e, "could not load copra records");
                self.status.set(format!("Could not load records: {e}"));
            }
        }
        match store::list_areas(conn) {
            Ok(areas) => self.areas = areas,
            Err(e) => {
                tracing::error!(error = %e, "could not load areas");
                self.status.set(format!("Could not load areas: {e}"));
            }
        }
        if self.records.is_empty() {
            self.selection = 0;
        } else {
            self.selection = self.selection.min(self.records.len() - 1);
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        if let Some(form) = self.modal.form() {
            let title = if self.modal.editing_id().is_some() {
                "Edit Copra Record"
            } else {
                "Add Copra Record"
            };
            let content = draw_chrome(frame, &self.greeting, FORM_HINTS, None);
            frame.render_widget(
                Paragraph::new(form_lines(title, &form.form, self.status.get())),
                content,
            );
            return;
        }

        let footer = match self.screen {
            Screen::ConfirmDelete => "y=confirm  n=cancel",
            Screen::List => "a=add  e=edit  d=delete  Up/Down=select  Esc=back",
        };
        let content = draw_chrome(frame, &self.greeting, footer, self.status.get());

        let [cards_area, table_area] =
            Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).areas(content);

        self.draw_cards(frame, cards_area);
        self.draw_table(frame, table_area);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let totals = copras_totals(&self.records, self.split);
        let groups = area_summaries(&self.records, self.split);
        let best_sales = best_area(&groups, Metric::Sales);
        let best_net = best_area(&groups, Metric::Net);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

        let left_lines = vec![
            Line::from(""),
            title_line("Copra Records"),
            Line::from(vec![Span::raw(" Total Sales     "), money_span(totals.sales)]),
            Line::from(vec![Span::raw(" Total Expenses  "), money_span(-totals.expenses)]),
            Line::from(vec![Span::raw(" Net Income      "), money_span(totals.net)]),
        ];
        frame.render_widget(Paragraph::new(left_lines), left);

        let split_note = match self.split {
            NetSplit::Full => "net reported whole",
            NetSplit::Halved => "net halved between owners",
        };
        let right_lines = vec![
            Line::from(""),
            title_line("Best Performing Area"),
            best_line("By sales", best_sales.map(|b| (b.name.as_str(), b.sales))),
            best_line("By net income", best_net.map(|b| (b.name.as_str(), b.net))),
            Line::from(Span::styled(format!(" {split_note}"), Style::default().fg(Color::DarkGray))),
        ];
        frame.render_widget(Paragraph::new(right_lines), right);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from("")];
        if self.records.is_empty() {
            lines.push(Line::from("   No copra records yet. Press 'a' to add one."));
        } else {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled(
                    format!(
                        "{:<11} {:<16} {:<16} {:>13} {:>13} {:>13} {:>9} {:>10}",
                        "Date", "Area", "Farmer", "Sales", "Expenses", "Net", "Weight", "Price/kg"
                    ),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                ),
            ]));
            for (i, r) in self.records.iter().enumerate() {
                let marker = if i == self.selection { " > " } else { "   " };
                let style = if i == self.selection {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        "{marker}{:<11} {:<16} {:<16} {:>13} {:>13} {:>13} {:>9} {:>10}",
                        r.date.to_string(),
                        truncate(r.area_name.as_deref().unwrap_or("-"), 16),
                        truncate(&r.farmer, 16),
                        money(r.sales),
                        money(r.expenses),
                        money(r.net_income(self.split)),
                        kilos(r.weight),
                        money(r.price_per_kilo()),
                    ),
                    style,
                )));
            }
        }

        if let Screen::ConfirmDelete = self.screen {
            if let Some(r) = self.records.get(self.selection) {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("   Delete record for {} on {}? (y/n)", r.farmer, r.date),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        // header rows come before the first record
        let offset = scroll_offset(self.selection + 2, area.height);
        frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);
    }

    pub fn handle_key(&mut self, code: KeyCode, conn: &Connection) -> PageAction {
        self.status.tick();

        if self.modal.is_open() {
            self.handle_form_key(code, conn);
            return PageAction::Continue;
        }
        match self.screen {
            Screen::List => self.handle_list_key(code),
            Screen::ConfirmDelete => {
                self.handle_delete_key(code, conn);
                PageAction::Continue
            }
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> PageAction {
        match code {
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                if !self.records.is_empty() {
                    self.selection = (self.selection + 1).min(self.records.len() - 1);
                }
            }
            KeyCode::Char('a') => {
                if self.areas.is_empty() {
                    self.status.set("Add an area first: harvestbook areas add <name>");
                } else {
                    let today = chrono::Local::now().date_naive();
                    self.modal.open_create(CoprasForm::new(&self.areas, today));
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(r) = self.records.get(self.selection) {
                    self.modal.open_edit(r.id, CoprasForm::edit(&self.areas, r));
                }
            }
            KeyCode::Char('d') => {
                if !self.records.is_empty() {
                    self.screen = Screen::ConfirmDelete;
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return PageAction::Close,
            _ => {}
        }
        PageAction::Continue
    }

    fn handle_form_key(&mut self, code: KeyCode, conn: &Connection) {
        let input = match self.modal.form_mut() {
            Some(f) => f.form.handle_key(code),
            None => return,
        };
        match input {
            FormInput::Editing => {}
            FormInput::Cancel => self.modal.cancel(),
            FormInput::Submit => {
                let outcome = self.modal.submit(|submission| match submission {
                    Submission::Create(draft) => store::insert_copras(conn, &draft).map(|_| ()),
                    Submission::Update { id, draft } => {
                        store::update_copras(conn, id, &CoprasPatch::from(&draft))
                    }
                });
                match outcome {
                    SubmitOutcome::Saved => {
                        self.reload(conn);
                        self.status.set("Saved");
                    }
                    SubmitOutcome::Invalid(msg) => self.status.set(msg),
                    SubmitOutcome::Failed(msg) => self.status.set(format!("Could not save: {msg}")),
                    SubmitOutcome::Ignored => {}
                }
            }
        }
    }

    fn handle_delete_key(&mut self, code: KeyCode, conn: &Connection) {
        match code {
            KeyCode::Char('y') => {
                if let Some(r) = self.records.get(self.selection) {
                    let id = r.id;
                    match store::delete(conn, Table::CoprasRecords, id) {
                        Ok(()) => {
                            self.reload(conn);
                            self.status.set(format!("Deleted record {id}"));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, id, "delete failed");
                            self.status.set(e.to_string());
                        }
                    }
                }
                self.screen = Screen::List;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::List,
            _ => {}
        }
    }
}

fn best_line(label: &str, best: Option<(&str, f64)>) -> Line<'static> {
    match best {
        Some((name, value)) => Line::from(vec![
            Span::raw(format!(" {label:<16}")),
            Span::styled(format!("{name} "), Style::default().add_modifier(Modifier::BOLD)),
            money_span(value),
        ]),
        None => Line::from(format!(" {label:<16}-")),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use chrono::NaiveDate;

    fn seeded() -> (tempfile::TempDir, Connection) {
        let (dir, conn) = test_db();
        let area = store::add_area(&conn, "North", 4).unwrap();
        store::insert_copras(
            &conn,
            &store::CoprasDraft {
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                area_id: area,
                farmer: "Ana".into(),
                sales: 1000.0,
                expenses: 100.0,
                weight: 40.0,
            },
        )
        .unwrap();
        (dir, conn)
    }

    fn type_text(m: &mut CoprasManager, conn: &Connection, text: &str) {
        for c in text.chars() {
            m.handle_key(KeyCode::Char(c), conn);
        }
    }

    #[test]
    fn test_area_load_failure_is_reported() {
        let (_dir, conn) = seeded();
        let mut m = CoprasManager::new(&conn, "hi", NetSplit::Full);
        conn.execute_batch("PRAGMA foreign_keys = OFF; DROP TABLE areas;")
            .unwrap();
        m.reload(&conn);
        let status = m.status.get().unwrap();
        assert!(status.starts_with("Could not load areas"), "{status}");
    }

    #[test]
    fn test_add_record_through_modal() {
        let (_dir, conn) = seeded();
        let mut m = CoprasManager::new(&conn, "hi", NetSplit::Full);
        m.handle_key(KeyCode::Char('a'), &conn);
        assert!(m.modal.is_open());
        // Date is prefilled; move to Area and pick North
        m.handle_key(KeyCode::Tab, &conn);
        m.handle_key(KeyCode::Right, &conn);
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "Ben");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "500");
        m.handle_key(KeyCode::Enter, &conn);

        assert!(!m.modal.is_open());
        assert_eq!(m.records.len(), 2);
        assert_eq!(m.status.get(), Some("Saved"));
    }

    #[test]
    fn test_invalid_submit_keeps_modal_open() {
        let (_dir, conn) = seeded();
        let mut m = CoprasManager::new(&conn, "hi", NetSplit::Full);
        m.handle_key(KeyCode::Char('a'), &conn);
        m.handle_key(KeyCode::Enter, &conn);
        assert!(m.modal.is_open());
        assert_eq!(m.status.get(), Some("Area is required"));
        assert_eq!(m.records.len(), 1);
        m.handle_key(KeyCode::Esc, &conn);
        assert!(!m.modal.is_open());
    }

    #[test]
    fn test_edit_updates_selected_record() {
        let (_dir, conn) = seeded();
        let mut m = CoprasManager::new(&conn, "hi", NetSplit::Full);
        m.handle_key(KeyCode::Char('e'), &conn);
        assert!(m.modal.editing_id().is_some());
        m.handle_key(KeyCode::Tab, &conn);
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "ita");
        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.records[0].farmer, "Anaita");
        assert_eq!(m.records[0].sales, 1000.0);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (_dir, conn) = seeded();
        let mut m = CoprasManager::new(&conn, "hi", NetSplit::Full);
        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('n'), &conn);
        assert_eq!(m.records.len(), 1);
        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('y'), &conn);
        assert!(m.records.is_empty());
    }
}

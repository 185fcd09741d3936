use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rusqlite::Connection;

use crate::fmt::{kilos, long_date, money};
use crate::form::{
    CroppingForm, EntityForm, ExpenseForm, Form, FormInput, Modal, SaleForm, Submission,
    SubmitOutcome,
};
use crate::models::FishpondCropping;
use crate::reports::{cropping_age, cropping_totals};
use crate::store::{self, Table};
use crate::tui::{
    draw_chrome, form_lines, money_span, scroll_offset, title_line, PageAction, StatusLine,
    FORM_HINTS,
};

enum Screen {
    List,
    ConfirmComplete,
    ConfirmDelete,
}

/// Fishpond page: one card per cropping, the selected card expanded.
pub struct FishpondManager {
    croppings: Vec<FishpondCropping>,
    selection: usize,
    screen: Screen,
    new_cropping: Modal<CroppingForm>,
    expense: Modal<ExpenseForm>,
    sale: Modal<SaleForm>,
    /// Cropping the open expense/sale modal appends to.
    target: Option<i64>,
    status: StatusLine,
    greeting: String,
    today: NaiveDate,
}

impl FishpondManager {
    pub fn new(conn: &Connection, greeting: &str) -> Self {
        let mut manager = Self {
            croppings: Vec::new(),
            selection: 0,
            screen: Screen::List,
            new_cropping: Modal::default(),
            expense: Modal::default(),
            sale: Modal::default(),
            target: None,
            status: StatusLine::default(),
            greeting: greeting.to_string(),
            today: Local::now().date_naive(),
        };
        manager.reload(conn);
        manager
    }

    fn reload(&mut self, conn: &Connection) {
        match store::list_croppings(conn) {
            Ok(croppings) => self.croppings = croppings,
            Err(e) => {
                tracing::error!(error = %e, "could not load croppings");
                self.status.set(format!("Could not load croppings: {e}"));
            }
        }
        if self.croppings.is_empty() {
            self.selection = 0;
        } else {
            self.selection = self.selection.min(self.croppings.len() - 1);
        }
    }

    fn selected(&self) -> Option<&FishpondCropping> {
        self.croppings.get(self.selection)
    }

    fn open_form(&self) -> Option<(String, &Form)> {
        let target = self.target.map(|id| format!(" (Cropping #{id})")).unwrap_or_default();
        if let Some(f) = self.new_cropping.form() {
            return Some(("Start New Cropping".to_string(), &f.form));
        }
        if let Some(f) = self.expense.form() {
            return Some((format!("Add Expense{target}"), &f.form));
        }
        self.sale
            .form()
            .map(|f| (format!("Add Sale{target}"), &f.form))
    }

    pub fn draw(&self, frame: &mut Frame) {
        if let Some((title, form)) = self.open_form() {
            let content = draw_chrome(frame, &self.greeting, FORM_HINTS, None);
            frame.render_widget(
                Paragraph::new(form_lines(&title, form, self.status.get())),
                content,
            );
            return;
        }

        let footer = match self.screen {
            Screen::List => {
                "n=new cropping  x=expense  s=sale  c=complete  d=delete  Up/Down=select  Esc=back"
            }
            _ => "y=confirm  n=cancel",
        };
        let content = draw_chrome(frame, &self.greeting, footer, self.status.get());

        let mut lines = vec![Line::from(""), title_line("Fishpond Croppings"), Line::from("")];
        let mut selected_line = 0;

        if self.croppings.is_empty() {
            lines.push(Line::from("   No croppings yet. Press 'n' to start one."));
        }
        for (i, c) in self.croppings.iter().enumerate() {
            let is_selected = i == self.selection;
            if is_selected {
                selected_line = lines.len();
            }
            self.card_lines(c, is_selected, &mut lines);
        }

        match self.screen {
            Screen::ConfirmComplete => {
                if let Some(c) = self.selected() {
                    lines.push(Line::from(Span::styled(
                        format!("   Mark cropping #{} completed as of {}? (y/n)", c.id, self.today),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            Screen::ConfirmDelete => {
                if let Some(c) = self.selected() {
                    lines.push(Line::from(Span::styled(
                        format!("   Delete cropping #{} and all its entries? (y/n)", c.id),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            Screen::List => {}
        }

        let offset = scroll_offset(selected_line, content.height);
        frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), content);
    }

    fn card_lines(&self, c: &FishpondCropping, expanded: bool, lines: &mut Vec<Line<'static>>) {
        let totals = cropping_totals(c);
        let age = cropping_age(c, self.today);
        let marker = if expanded { " > " } else { "   " };
        let (badge, badge_color) = if c.completed {
            ("Completed", Color::DarkGray)
        } else {
            ("Ongoing", Color::Green)
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{marker}Cropping #{}  ", c.id),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("started {}  ", long_date(c.start_date))),
            Span::styled(format!("[{badge}]"), Style::default().fg(badge_color)),
            Span::styled(format!("  {age} days"), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("     Expenses "),
            money_span(-totals.expenses),
            Span::raw("   Sales "),
            money_span(totals.sales),
            Span::raw("   Net "),
            money_span(totals.net),
        ]));

        if expanded {
            if let Some(done) = c.completed_at {
                lines.push(Line::from(format!("     Completed {}", long_date(done))));
            }
            lines.push(Line::from(Span::styled(
                "     Expenses",
                Style::default().add_modifier(Modifier::UNDERLINED),
            )));
            if c.expenses.is_empty() {
                lines.push(Line::from("       (none)"));
            }
            for e in &c.expenses {
                lines.push(Line::from(format!(
                    "       {}  {:<24} {:>14}",
                    e.date,
                    e.name,
                    money(e.amount)
                )));
            }
            lines.push(Line::from(Span::styled(
                "     Sales",
                Style::default().add_modifier(Modifier::UNDERLINED),
            )));
            if c.sales.is_empty() {
                lines.push(Line::from("       (none)"));
            }
            for s in &c.sales {
                lines.push(Line::from(format!(
                    "       {}  {:<16} {:>8} kg @ {:>10} {:>14}",
                    s.date,
                    s.fish_type,
                    kilos(s.kilos),
                    money(s.price_per_kilo),
                    money(s.total)
                )));
            }
        }
        lines.push(Line::from(""));
    }

    pub fn handle_key(&mut self, code: KeyCode, conn: &Connection) -> PageAction {
        self.status.tick();

        if self.new_cropping.is_open() || self.expense.is_open() || self.sale.is_open() {
            self.handle_form_key(code, conn);
            return PageAction::Continue;
        }
        match self.screen {
            Screen::List => return self.handle_list_key(code),
            Screen::ConfirmComplete => self.handle_complete_key(code, conn),
            Screen::ConfirmDelete => self.handle_delete_key(code, conn),
        }
        PageAction::Continue
    }

    /// Selected cropping id, if it can still take entries.
    fn open_target(&mut self) -> Option<i64> {
        match self.croppings.get(self.selection) {
            None => None,
            Some(c) if c.completed => {
                self.status.set(format!("Cropping #{} is completed", c.id));
                None
            }
            Some(c) => Some(c.id),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> PageAction {
        match code {
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                if !self.croppings.is_empty() {
                    self.selection = (self.selection + 1).min(self.croppings.len() - 1);
                }
            }
            KeyCode::Char('n') => self.new_cropping.open_create(CroppingForm::new(self.today)),
            KeyCode::Char('x') => {
                if let Some(id) = self.open_target() {
                    self.target = Some(id);
                    self.expense.open_create(ExpenseForm::new(self.today));
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.open_target() {
                    self.target = Some(id);
                    self.sale.open_create(SaleForm::new(self.today));
                }
            }
            KeyCode::Char('c') => {
                if self.open_target().is_some() {
                    self.screen = Screen::ConfirmComplete;
                }
            }
            KeyCode::Char('d') => {
                if self.selected().is_some() {
                    self.screen = Screen::ConfirmDelete;
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return PageAction::Close,
            _ => {}
        }
        PageAction::Continue
    }

    fn handle_form_key(&mut self, code: KeyCode, conn: &Connection) {
        let outcome = if self.new_cropping.is_open() {
            drive(&mut self.new_cropping, code, |s| match s {
                Submission::Create(date) | Submission::Update { draft: date, .. } => {
                    store::start_cropping(conn, date).map(|_| ())
                }
            })
        } else if self.expense.is_open() {
            let id = self.target;
            drive(&mut self.expense, code, |s| match (s, id) {
                (Submission::Create(e) | Submission::Update { draft: e, .. }, Some(id)) => {
                    store::add_expense(conn, id, e)
                }
                (_, None) => Ok(()),
            })
        } else {
            let id = self.target;
            drive(&mut self.sale, code, |s| match (s, id) {
                (Submission::Create(sale) | Submission::Update { draft: sale, .. }, Some(id)) => {
                    store::add_sale(conn, id, sale)
                }
                (_, None) => Ok(()),
            })
        };

        match outcome {
            Some(SubmitOutcome::Saved) => {
                self.target = None;
                self.reload(conn);
                self.status.set("Saved");
            }
            Some(SubmitOutcome::Invalid(msg)) => self.status.set(msg),
            Some(SubmitOutcome::Failed(msg)) => self.status.set(format!("Could not save: {msg}")),
            Some(SubmitOutcome::Ignored) => {}
            None => {
                if !self.expense.is_open() && !self.sale.is_open() {
                    self.target = None;
                }
            }
        }
    }

    fn handle_complete_key(&mut self, code: KeyCode, conn: &Connection) {
        match code {
            KeyCode::Char('y') => {
                if let Some(id) = self.selected().map(|c| c.id) {
                    match store::complete_cropping(conn, id, self.today) {
                        Ok(()) => {
                            self.reload(conn);
                            self.status.set(format!("Cropping #{id} completed"));
                        }
                        Err(e) => self.status.set(e.to_string()),
                    }
                }
                self.screen = Screen::List;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::List,
            _ => {}
        }
    }

    fn handle_delete_key(&mut self, code: KeyCode, conn: &Connection) {
        match code {
            KeyCode::Char('y') => {
                if let Some(id) = self.selected().map(|c| c.id) {
                    match store::delete(conn, Table::FishpondCroppings, id) {
                        Ok(()) => {
                            self.reload(conn);
                            self.status.set(format!("Deleted cropping #{id}"));
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

/// Feed one key to an open modal. Returns an outcome only when the key submitted.
fn drive<F, W>(modal: &mut Modal<F>, code: KeyCode, write: W) -> Option<SubmitOutcome>
where
    F: EntityForm + HasForm,
    W: FnOnce(Submission<F::Draft>) -> crate::error::Result<()>,
{
    let input = modal.form_mut()?.inner_form().handle_key(code);
    match input {
        FormInput::Editing => None,
        FormInput::Cancel => {
            modal.cancel();
            None
        }
        FormInput::Submit => Some(modal.submit(write)),
    }
}

trait HasForm {
    fn inner_form(&mut self) -> &mut Form;
}

impl HasForm for CroppingForm {
    fn inner_form(&mut self) -> &mut Form {
        &mut self.form
    }
}

impl HasForm for ExpenseForm {
    fn inner_form(&mut self) -> &mut Form {
        &mut self.form
    }
}

impl HasForm for SaleForm {
    fn inner_form(&mut self) -> &mut Form {
        &mut self.form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn type_text(m: &mut FishpondManager, conn: &Connection, text: &str) {
        for c in text.chars() {
            m.handle_key(KeyCode::Char(c), conn);
        }
    }

    fn manager_with_cropping() -> (tempfile::TempDir, Connection, FishpondManager) {
        let (dir, conn) = test_db();
        store::start_cropping(&conn, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()).unwrap();
        let m = FishpondManager::new(&conn, "hi");
        (dir, conn, m)
    }

    #[test]
    fn test_start_cropping_from_modal() {
        let (_dir, conn) = test_db();
        let mut m = FishpondManager::new(&conn, "hi");
        m.handle_key(KeyCode::Char('n'), &conn);
        assert!(m.new_cropping.is_open());
        m.handle_key(KeyCode::Enter, &conn);
        assert!(!m.new_cropping.is_open());
        assert_eq!(m.croppings.len(), 1);
        assert!(!m.croppings[0].completed);
    }

    #[test]
    fn test_expense_appends_to_selected_cropping() {
        let (_dir, conn, mut m) = manager_with_cropping();
        m.handle_key(KeyCode::Char('x'), &conn);
        type_text(&mut m, &conn, "Feeds");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "1,250.50");
        m.handle_key(KeyCode::Enter, &conn);

        assert!(!m.expense.is_open());
        assert_eq!(m.croppings[0].expenses.len(), 1);
        assert_eq!(m.croppings[0].expenses[0].amount, 1250.5);
        assert_eq!(m.target, None);
    }

    #[test]
    fn test_sale_total_is_kilos_times_price() {
        let (_dir, conn, mut m) = manager_with_cropping();
        m.handle_key(KeyCode::Char('s'), &conn);
        type_text(&mut m, &conn, "Bangus");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "12.5");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "40");
        m.handle_key(KeyCode::Enter, &conn);

        assert_eq!(m.croppings[0].sales.len(), 1);
        assert_eq!(m.croppings[0].sales[0].total, 500.0);
    }

    #[test]
    fn test_completed_cropping_refuses_entries() {
        let (_dir, conn, mut m) = manager_with_cropping();
        m.handle_key(KeyCode::Char('c'), &conn);
        m.handle_key(KeyCode::Char('y'), &conn);
        assert!(m.croppings[0].completed);

        m.handle_key(KeyCode::Char('x'), &conn);
        assert!(!m.expense.is_open());
        assert!(m.status.get().unwrap().contains("completed"));
    }

    #[test]
    fn test_cancel_expense_clears_target() {
        let (_dir, conn, mut m) = manager_with_cropping();
        m.handle_key(KeyCode::Char('x'), &conn);
        assert!(m.target.is_some());
        m.handle_key(KeyCode::Esc, &conn);
        assert!(!m.expense.is_open());
        assert_eq!(m.target, None);
    }

    #[test]
    fn test_delete_cropping() {
        let (_dir, conn, mut m) = manager_with_cropping();
        m.handle_key(KeyCode::Char('d'), &conn);
        m.handle_key(KeyCode::Char('y'), &conn);
        assert!(m.croppings.is_empty());
    }
}

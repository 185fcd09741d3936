use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use rusqlite::Connection;

use crate::fmt::{money, month_name};
use crate::form::{FormInput, Modal, RentalBatchForm, Submission, SubmitOutcome, TenantForm};
use crate::models::{PaymentStatus, RentalRecord, Tenant};
use crate::reports::{group_transactions, TransactionGroup};
use crate::store::{self, RentalFilter};
use crate::tui::{
    draw_chrome, form_lines, money_span, scroll_offset, title_line, PageAction, StatusLine,
    FORM_HINTS,
};

/// Rental page: tenants, then one block per collection round. Rows can be
/// cycled through unpaid, paid and exempted in place.
pub struct RentalManager {
    tenants: Vec<Tenant>,
    groups: Vec<TransactionGroup>,
    /// Index into the flattened rows of every group.
    selection: usize,
    collect: Modal<RentalBatchForm>,
    tenant: Modal<TenantForm>,
    status: StatusLine,
    greeting: String,
}

fn status_style(status: PaymentStatus) -> Style {
    match status {
        PaymentStatus::Paid => Style::default().fg(Color::Green),
        PaymentStatus::Unpaid => Style::default().fg(Color::Red),
        PaymentStatus::Exempted => Style::default().fg(Color::DarkGray),
    }
}

impl RentalManager {
    pub fn new(conn: &Connection, greeting: &str) -> Self {
        let mut manager = Self {
            tenants: Vec::new(),
            groups: Vec::new(),
            selection: 0,
            collect: Modal::default(),
            tenant: Modal::default(),
            status: StatusLine::default(),
            greeting: greeting.to_string(),
        };
        manager.reload(conn);
        manager
    }

    fn reload(&mut self, conn: &Connection) {
        self.tenants = store::list_tenants(conn).unwrap_or_default();
        match store::list_rentals(conn, &RentalFilter::default()) {
            Ok(rows) => {
                // newest round first
                let mut groups = group_transactions(&rows);
                groups.reverse();
                self.groups = groups;
            }
            Err(e) => {
                tracing::error!(error = %e, "could not load rental records");
                self.status.set(format!("Could not load rentals: {e}"));
            }
        }
        let rows = self.row_count();
        if rows == 0 {
            self.selection = 0;
        } else {
            self.selection = self.selection.min(rows - 1);
        }
    }

    fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    fn selected_row(&self) -> Option<&RentalRecord> {
        self.groups.iter().flat_map(|g| g.rows.iter()).nth(self.selection)
    }

    pub fn draw(&self, frame: &mut Frame) {
        if let Some(f) = self.collect.form() {
            let content = draw_chrome(frame, &self.greeting, FORM_HINTS, None);
            frame.render_widget(
                Paragraph::new(form_lines("Collect Rent", &f.form, self.status.get())),
                content,
            );
            return;
        }
        if let Some(f) = self.tenant.form() {
            let content = draw_chrome(frame, &self.greeting, FORM_HINTS, None);
            frame.render_widget(
                Paragraph::new(form_lines("Add Tenant", &f.form, self.status.get())),
                content,
            );
            return;
        }

        let content = draw_chrome(
            frame,
            &self.greeting,
            "c=collect  t=add tenant  Enter=cycle status  Up/Down=select  Esc=back",
            self.status.get(),
        );
        let tenant_height = self.tenants.len().max(1) as u16 + 3;
        let [tenant_area, rounds_area] =
            Layout::vertical([Constraint::Length(tenant_height), Constraint::Fill(1)]).areas(content);

        let mut tenant_lines = vec![Line::from(""), title_line("Tenants")];
        if self.tenants.is_empty() {
            tenant_lines.push(Line::from("   No tenants yet. Press 't' to add one."));
        }
        for t in &self.tenants {
            tenant_lines.push(Line::from(vec![
                Span::raw(format!("   {:<28}", t.name)),
                Span::raw(money(t.tax_amount)),
            ]));
        }
        frame.render_widget(Paragraph::new(tenant_lines), tenant_area);

        let mut lines = vec![Line::from(""), title_line("Collections")];
        let mut flat = 0;
        let mut selected_line = 0;
        if self.groups.is_empty() {
            lines.push(Line::from("   No collections yet. Press 'c' to collect rent."));
        }
        for g in &self.groups {
            let badge = if g.is_open() {
                Span::styled("[Open]", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("[Settled]", Style::default().fg(Color::Green))
            };
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("   {} {}  ", month_name(g.month), g.year),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                badge,
                Span::raw("  Collected "),
                money_span(g.collected),
                Span::raw(format!(" of {}", money(g.expected))),
            ]));
            for row in &g.rows {
                let is_selected = flat == self.selection;
                if is_selected {
                    selected_line = lines.len();
                }
                let marker = if is_selected { "   > " } else { "     " };
                let name_style = if is_selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}{:<26}", row.tenant_name), name_style),
                    Span::raw(format!("{:>14}  ", money(row.tax_amount))),
                    Span::styled(row.status.as_str(), status_style(row.status)),
                ]));
                flat += 1;
            }
        }
        let offset = scroll_offset(selected_line, rounds_area.height);
        frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), rounds_area);
    }

    pub fn handle_key(&mut self, code: KeyCode, conn: &Connection) -> PageAction {
        self.status.tick();

        if self.collect.is_open() {
            self.handle_collect_key(code, conn);
            return PageAction::Continue;
        }
        if self.tenant.is_open() {
            self.handle_tenant_key(code, conn);
            return PageAction::Continue;
        }

        match code {
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                let rows = self.row_count();
                if rows > 0 {
                    self.selection = (self.selection + 1).min(rows - 1);
                }
            }
            KeyCode::Char('c') => {
                if self.tenants.is_empty() {
                    self.status.set("Add a tenant before collecting rent");
                } else {
                    let today = Local::now().date_naive();
                    self.collect.open_create(RentalBatchForm::new(&self.tenants, today));
                }
            }
            KeyCode::Char('t') => self.tenant.open_create(TenantForm::new()),
            KeyCode::Enter | KeyCode::Char(' ') => self.cycle_selected(conn),
            KeyCode::Char('q') | KeyCode::Esc => return PageAction::Close,
            _ => {}
        }
        PageAction::Continue
    }

    fn cycle_selected(&mut self, conn: &Connection) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let (id, name, next) = (row.id, row.tenant_name.clone(), row.status.next());
        match store::set_rental_status(conn, id, next) {
            Ok(()) => {
                self.reload(conn);
                self.status.set(format!("{name}: {next}"));
            }
            Err(e) => {
                tracing::error!(error = %e, id, "status update failed");
                self.status.set(e.to_string());
            }
        }
    }

    fn handle_collect_key(&mut self, code: KeyCode, conn: &Connection) {
        let input = match self.collect.form_mut() {
            Some(f) => f.form.handle_key(code),
            None => return,
        };
        match input {
            FormInput::Editing => {}
            FormInput::Cancel => self.collect.cancel(),
            FormInput::Submit => {
                let outcome = self.collect.submit(|s| match s {
                    Submission::Create(batch) | Submission::Update { draft: batch, .. } => {
                        store::insert_rental_batch(conn, batch.month, batch.year, &batch.rows)
                            .map(|_| ())
                    }
                });
                self.apply_outcome(outcome, conn, "Collection saved");
            }
        }
    }

    fn handle_tenant_key(&mut self, code: KeyCode, conn: &Connection) {
        let input = match self.tenant.form_mut() {
            Some(f) => f.form.handle_key(code),
            None => return,
        };
        match input {
            FormInput::Editing => {}
            FormInput::Cancel => self.tenant.cancel(),
            FormInput::Submit => {
                let outcome = self.tenant.submit(|s| match s {
                    Submission::Create(t) | Submission::Update { draft: t, .. } => {
                        store::add_tenant(conn, &t.name, t.tax_amount).map(|_| ())
                    }
                });
                self.apply_outcome(outcome, conn, "Tenant added");
            }
        }
    }

    fn apply_outcome(&mut self, outcome: SubmitOutcome, conn: &Connection, saved: &str) {
        match outcome {
            SubmitOutcome::Saved => {
                self.reload(conn);
                self.status.set(saved);
            }
            SubmitOutcome::Invalid(msg) => self.status.set(msg),
            SubmitOutcome::Failed(msg) => self.status.set(format!("Could not save: {msg}")),
            SubmitOutcome::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn type_text(m: &mut RentalManager, conn: &Connection, text: &str) {
        for c in text.chars() {
            m.handle_key(KeyCode::Char(c), conn);
        }
    }

    #[test]
    fn test_add_tenant_then_collect() {
        let (_dir, conn) = test_db();
        let mut m = RentalManager::new(&conn, "hi");

        m.handle_key(KeyCode::Char('c'), &conn);
        assert!(!m.collect.is_open());

        m.handle_key(KeyCode::Char('t'), &conn);
        type_text(&mut m, &conn, "Reyes");
        m.handle_key(KeyCode::Tab, &conn);
        type_text(&mut m, &conn, "1500");
        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.tenants.len(), 1);

        m.handle_key(KeyCode::Char('c'), &conn);
        assert!(m.collect.is_open());
        // Month, Year, then the tenant's status: move to it and pick "paid"
        m.handle_key(KeyCode::Tab, &conn);
        m.handle_key(KeyCode::Tab, &conn);
        m.handle_key(KeyCode::Right, &conn);
        m.handle_key(KeyCode::Enter, &conn);

        assert!(!m.collect.is_open());
        assert_eq!(m.groups.len(), 1);
        assert_eq!(m.groups[0].rows[0].status, PaymentStatus::Paid);
        assert_eq!(m.groups[0].collected, 1500.0);
    }

    #[test]
    fn test_enter_cycles_selected_row_status() {
        let (_dir, conn) = test_db();
        store::add_tenant(&conn, "Reyes", 100.0).unwrap();
        store::insert_rental_batch(
            &conn,
            3,
            2025,
            &[store::RentalDraft {
                tenant_name: "Reyes".into(),
                tax_amount: 100.0,
                status: PaymentStatus::Unpaid,
            }],
        )
        .unwrap();
        let mut m = RentalManager::new(&conn, "hi");

        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.selected_row().unwrap().status, PaymentStatus::Paid);
        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.selected_row().unwrap().status, PaymentStatus::Exempted);
        m.handle_key(KeyCode::Enter, &conn);
        assert_eq!(m.selected_row().unwrap().status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_invalid_year_keeps_collect_open() {
        let (_dir, conn) = test_db();
        store::add_tenant(&conn, "Reyes", 100.0).unwrap();
        let mut m = RentalManager::new(&conn, "hi");
        m.handle_key(KeyCode::Char('c'), &conn);
        m.handle_key(KeyCode::Tab, &conn);
        for _ in 0..4 {
            m.handle_key(KeyCode::Backspace, &conn);
        }
        type_text(&mut m, &conn, "19");
        m.handle_key(KeyCode::Enter, &conn);
        assert!(m.collect.is_open());
        assert_eq!(m.status.get(), Some("Invalid year: 19"));
        assert!(m.groups.is_empty());
    }
}

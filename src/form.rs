//! Add/edit forms and the modal state that gates writes.
//!
//! A page owns one `Modal<F>` per form it can open. The modal is either
//! closed, collecting a new record, or editing an existing one; `submit`
//! validates first and only writes when validation passes.

use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

use crate::amount;
use crate::error::HarvestError;
use crate::fmt;
use crate::models::{Area, CoprasRecord, Expense, PaymentStatus, Sale, Tenant};
use crate::store::{CoprasDraft, RentalDraft, RENTAL_YEARS};

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

pub struct FormField {
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

pub enum FieldKind {
    Text,
    Selector { options: Vec<String>, selected: usize },
}

impl FormField {
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn selector(label: impl Into<String>, options: Vec<String>, selected: usize) -> Self {
        let selected = selected.min(options.len().saturating_sub(1));
        let value = options.get(selected).cloned().unwrap_or_default();
        Self {
            label: label.into(),
            value,
            kind: FieldKind::Selector { options, selected },
        }
    }

    /// Index of the chosen option, for selector fields.
    pub fn selected(&self) -> Option<usize> {
        match &self.kind {
            FieldKind::Selector { selected, .. } => Some(*selected),
            FieldKind::Text => None,
        }
    }
}

/// What a key press meant to the form.
#[derive(Debug, PartialEq, Eq)]
pub enum FormInput {
    Editing,
    Submit,
    Cancel,
}

pub struct Form {
    pub fields: Vec<FormField>,
    pub focused: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormInput {
        use KeyCode::*;
        if self.fields.is_empty() {
            return match code {
                Esc => FormInput::Cancel,
                Enter => FormInput::Submit,
                _ => FormInput::Editing,
            };
        }
        match code {
            Esc => return FormInput::Cancel,
            Enter => return FormInput::Submit,
            Tab | Down => {
                self.focused = (self.focused + 1) % self.fields.len();
            }
            BackTab | Up => {
                self.focused = if self.focused == 0 {
                    self.fields.len() - 1
                } else {
                    self.focused - 1
                };
            }
            Left => {
                if let FieldKind::Selector { options, selected } = &mut self.fields[self.focused].kind {
                    if !options.is_empty() {
                        *selected = if *selected == 0 {
                            options.len() - 1
                        } else {
                            *selected - 1
                        };
                        self.fields[self.focused].value = options[*selected].clone();
                    }
                }
            }
            Right => {
                if let FieldKind::Selector { options, selected } = &mut self.fields[self.focused].kind {
                    if !options.is_empty() {
                        *selected = (*selected + 1) % options.len();
                        self.fields[self.focused].value = options[*selected].clone();
                    }
                }
            }
            Char(c) => {
                if let FieldKind::Text = &self.fields[self.focused].kind {
                    self.fields[self.focused].value.push(c);
                }
            }
            Backspace => {
                if let FieldKind::Text = &self.fields[self.focused].kind {
                    self.fields[self.focused].value.pop();
                }
            }
            _ => {}
        }
        FormInput::Editing
    }
}

// ---------------------------------------------------------------------------
// Modal lifecycle
// ---------------------------------------------------------------------------

/// A form that can turn its raw input into a typed draft.
pub trait EntityForm {
    type Draft;

    fn validate(&self) -> Result<Self::Draft, HarvestError>;
}

pub enum Submission<D> {
    Create(D),
    Update { id: i64, draft: D },
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Written; the modal closed and the page should refetch.
    Saved,
    /// Validation failed before any write; the modal stays open.
    Invalid(String),
    /// The write failed; the modal stays open.
    Failed(String),
    /// Submit while closed does nothing.
    Ignored,
}

pub enum Modal<F> {
    Closed,
    Create(F),
    Edit { id: i64, form: F },
}

impl<F> Default for Modal<F> {
    fn default() -> Self {
        Modal::Closed
    }
}

impl<F: EntityForm> Modal<F> {
    pub fn is_open(&self) -> bool {
        !matches!(self, Modal::Closed)
    }

    pub fn open_create(&mut self, form: F) {
        if !self.is_open() {
            *self = Modal::Create(form);
        }
    }

    pub fn open_edit(&mut self, id: i64, form: F) {
        if !self.is_open() {
            *self = Modal::Edit { id, form };
        }
    }

    pub fn form(&self) -> Option<&F> {
        match self {
            Modal::Closed => None,
            Modal::Create(form) | Modal::Edit { form, .. } => Some(form),
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut F> {
        match self {
            Modal::Closed => None,
            Modal::Create(form) | Modal::Edit { form, .. } => Some(form),
        }
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self {
            Modal::Edit { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Discard whatever was typed.
    pub fn cancel(&mut self) {
        *self = Modal::Closed;
    }

    /// Validate, then hand the draft to `write`. Closes only on a successful write.
    pub fn submit<W>(&mut self, write: W) -> SubmitOutcome
    where
        W: FnOnce(Submission<F::Draft>) -> Result<(), HarvestError>,
    {
        let (draft, id) = match self {
            Modal::Closed => return SubmitOutcome::Ignored,
            Modal::Create(form) => (form.validate(), None),
            Modal::Edit { id, form } => (form.validate(), Some(*id)),
        };
        let draft = match draft {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "form rejected");
                return SubmitOutcome::Invalid(e.to_string());
            }
        };
        let submission = match id {
            None => Submission::Create(draft),
            Some(id) => Submission::Update { id, draft },
        };
        match write(submission) {
            Ok(()) => {
                *self = Modal::Closed;
                SubmitOutcome::Saved
            }
            Err(e) => {
                tracing::error!(error = %e, "write failed");
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entity forms
// ---------------------------------------------------------------------------

const SELECT_AREA: &str = "Select Area";

fn required_text(field: &str, value: &str) -> Result<String, HarvestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HarvestError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn amount_text(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        value.to_string()
    }
}

pub struct CoprasForm {
    pub form: Form,
    /// Area id per selector option; option 0 is the "Select Area" placeholder.
    area_ids: Vec<Option<i64>>,
}

impl CoprasForm {
    const DATE: usize = 0;
    const AREA: usize = 1;
    const FARMER: usize = 2;
    const SALES: usize = 3;
    const EXPENSES: usize = 4;
    const WEIGHT: usize = 5;

    pub fn new(areas: &[Area], today: NaiveDate) -> Self {
        Self::build(areas, &today.to_string(), None, "", "", "", "")
    }

    pub fn edit(areas: &[Area], record: &CoprasRecord) -> Self {
        Self::build(
            areas,
            &record.date.to_string(),
            record.area_id,
            &record.farmer,
            &amount_text(record.sales),
            &amount_text(record.expenses),
            &amount_text(record.weight),
        )
    }

    fn build(
        areas: &[Area],
        date: &str,
        area_id: Option<i64>,
        farmer: &str,
        sales: &str,
        expenses: &str,
        weight: &str,
    ) -> Self {
        let mut options = vec![SELECT_AREA.to_string()];
        let mut area_ids = vec![None];
        for area in areas {
            options.push(area.name.clone());
            area_ids.push(Some(area.id));
        }
        let selected = area_ids
            .iter()
            .position(|id| id.is_some() && *id == area_id)
            .unwrap_or(0);
        Self {
            form: Form::new(vec![
                FormField::text("Date", date),
                FormField::selector("Area", options, selected),
                FormField::text("Farmer", farmer),
                FormField::text("Sales", sales),
                FormField::text("Expenses", expenses),
                FormField::text("Weight (kg)", weight),
            ]),
            area_ids,
        }
    }
}

impl EntityForm for CoprasForm {
    type Draft = CoprasDraft;

    fn validate(&self) -> Result<CoprasDraft, HarvestError> {
        let date = amount::parse_required_date("Date", self.form.value(Self::DATE))?;
        let area_id = self.form.fields[Self::AREA]
            .selected()
            .and_then(|i| self.area_ids.get(i).copied().flatten())
            .ok_or_else(|| HarvestError::Validation("Area is required".into()))?;
        let farmer = required_text("Farmer", self.form.value(Self::FARMER))?;
        Ok(CoprasDraft {
            date,
            area_id,
            farmer,
            sales: amount::parse_optional_amount("Sales", self.form.value(Self::SALES))?,
            expenses: amount::parse_optional_amount("Expenses", self.form.value(Self::EXPENSES))?,
            weight: amount::parse_optional_amount("Weight", self.form.value(Self::WEIGHT))?,
        })
    }
}

pub struct CroppingForm {
    pub form: Form,
}

impl CroppingForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            form: Form::new(vec![FormField::text("Start Date", today.to_string())]),
        }
    }
}

impl EntityForm for CroppingForm {
    type Draft = NaiveDate;

    fn validate(&self) -> Result<NaiveDate, HarvestError> {
        amount::parse_required_date("Start date", self.form.value(0))
    }
}

pub struct ExpenseForm {
    pub form: Form,
}

impl ExpenseForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            form: Form::new(vec![
                FormField::text("Expense", ""),
                FormField::text("Amount", ""),
                FormField::text("Date", today.to_string()),
            ]),
        }
    }
}

impl EntityForm for ExpenseForm {
    type Draft = Expense;

    fn validate(&self) -> Result<Expense, HarvestError> {
        Ok(Expense {
            name: required_text("Expense name", self.form.value(0))?,
            amount: amount::parse_amount("Amount", self.form.value(1))?,
            date: amount::parse_required_date("Date", self.form.value(2))?,
        })
    }
}

pub struct SaleForm {
    pub form: Form,
}

impl SaleForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            form: Form::new(vec![
                FormField::text("Fish Type", ""),
                FormField::text("Kilos", ""),
                FormField::text("Price / Kilo", ""),
                FormField::text("Date", today.to_string()),
            ]),
        }
    }
}

impl EntityForm for SaleForm {
    type Draft = Sale;

    fn validate(&self) -> Result<Sale, HarvestError> {
        let fish_type = required_text("Fish type", self.form.value(0))?;
        let kilos = amount::parse_amount("Kilos", self.form.value(1))?;
        let price = amount::parse_amount("Price per kilo", self.form.value(2))?;
        let date = amount::parse_required_date("Date", self.form.value(3))?;
        Ok(Sale::new(&fish_type, kilos, price, date))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TenantDraft {
    pub name: String,
    pub tax_amount: f64,
}

pub struct TenantForm {
    pub form: Form,
}

impl TenantForm {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                FormField::text("Name", ""),
                FormField::text("Tax Amount", ""),
            ]),
        }
    }
}

impl EntityForm for TenantForm {
    type Draft = TenantDraft;

    fn validate(&self) -> Result<TenantDraft, HarvestError> {
        Ok(TenantDraft {
            name: required_text("Tenant name", self.form.value(0))?,
            tax_amount: amount::parse_optional_amount("Tax amount", self.form.value(1))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalBatch {
    pub month: u32,
    pub year: i32,
    pub rows: Vec<RentalDraft>,
}

/// One collection round: month, year, then a status selector per tenant.
pub struct RentalBatchForm {
    pub form: Form,
    tenants: Vec<Tenant>,
}

impl RentalBatchForm {
    const MONTH: usize = 0;
    const YEAR: usize = 1;
    const FIRST_TENANT: usize = 2;

    pub fn new(tenants: &[Tenant], today: NaiveDate) -> Self {
        let months = (1..=12).map(|m| fmt::month_name(m).to_string()).collect();
        let statuses: Vec<String> = PaymentStatus::ALL
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let mut fields = vec![
            FormField::selector("Month", months, today.month0() as usize),
            FormField::text("Year", today.year().to_string()),
        ];
        for tenant in tenants {
            fields.push(FormField::selector(
                format!("{} ({})", tenant.name, fmt::money(tenant.tax_amount)),
                statuses.clone(),
                0,
            ));
        }
        Self {
            form: Form::new(fields),
            tenants: tenants.to_vec(),
        }
    }
}

impl EntityForm for RentalBatchForm {
    type Draft = RentalBatch;

    fn validate(&self) -> Result<RentalBatch, HarvestError> {
        let month = self.form.fields[Self::MONTH]
            .selected()
            .map(|i| i as u32 + 1)
            .ok_or_else(|| HarvestError::Validation("Month is required".into()))?;
        let year_text = self.form.value(Self::YEAR).trim();
        let year: i32 = year_text
            .parse()
            .ok()
            .filter(|y| RENTAL_YEARS.contains(y))
            .ok_or_else(|| HarvestError::Validation(format!("Invalid year: {year_text}")))?;
        if self.tenants.is_empty() {
            return Err(HarvestError::Validation(
                "Add a tenant before collecting rent".into(),
            ));
        }
        let rows = self
            .tenants
            .iter()
            .enumerate()
            .map(|(i, tenant)| {
                let status = self.form.fields[Self::FIRST_TENANT + i]
                    .selected()
                    .and_then(|s| PaymentStatus::ALL.get(s).copied())
                    .unwrap_or(PaymentStatus::Unpaid);
                RentalDraft {
                    tenant_name: tenant.name.clone(),
                    tax_amount: tenant.tax_amount,
                    status,
                }
            })
            .collect();
        Ok(RentalBatch { month, year, rows })
    }
}

pub struct LogForm {
    pub form: Form,
}

impl LogForm {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![FormField::text("Activity", "")]),
        }
    }
}

impl EntityForm for LogForm {
    type Draft = String;

    fn validate(&self) -> Result<String, HarvestError> {
        required_text("Activity", self.form.value(0))
    }
}

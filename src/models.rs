use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub last_harvest_date: Option<NaiveDate>,
    pub next_harvest_date: Option<NaiveDate>,
    pub cycle_months: u32,
}

#[derive(Debug, Clone)]
pub struct CoprasHarvest {
    pub id: i64,
    pub area_id: i64,
    pub harvest_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoprasRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub area_id: Option<i64>,
    /// Joined from `areas`; `None` when the record has no area.
    pub area_name: Option<String>,
    pub farmer: String,
    pub sales: f64,
    pub expenses: f64,
    pub weight: f64,
}

impl CoprasRecord {
    pub fn net_income(&self, split: NetSplit) -> f64 {
        split.apply(self.sales - self.expenses)
    }

    pub fn price_per_kilo(&self) -> f64 {
        if self.weight > 0.0 {
            self.sales / self.weight
        } else {
            0.0
        }
    }
}

/// How copra net income is divided before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetSplit {
    /// Net income is reported whole.
    #[default]
    Full,
    /// Net income is halved between the two owners.
    Halved,
}

impl NetSplit {
    pub fn apply(self, net: f64) -> f64 {
        match self {
            NetSplit::Full => net,
            NetSplit::Halved => net / 2.0,
        }
    }
}

impl fmt::Display for NetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetSplit::Full => "full",
            NetSplit::Halved => "halved",
        })
    }
}

impl FromStr for NetSplit {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(NetSplit::Full),
            "halved" | "half" => Ok(NetSplit::Halved),
            other => Err(HarvestError::Settings(format!(
                "unknown net split '{other}' (expected full or halved)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub fish_type: String,
    pub kilos: f64,
    pub price_per_kilo: f64,
    /// Fixed when the sale is recorded.
    pub total: f64,
    pub date: NaiveDate,
}

impl Sale {
    pub fn new(fish_type: &str, kilos: f64, price_per_kilo: f64, date: NaiveDate) -> Self {
        Self {
            fish_type: fish_type.to_string(),
            kilos,
            price_per_kilo,
            total: kilos * price_per_kilo,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FishpondCropping {
    pub id: i64,
    pub start_date: NaiveDate,
    pub expenses: Vec<Expense>,
    pub sales: Vec<Sale>,
    pub completed: bool,
    pub completed_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub tax_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Exempted,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Unpaid,
        PaymentStatus::Paid,
        PaymentStatus::Exempted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Exempted => "exempted",
        }
    }

    /// Next status in the unpaid → paid → exempted cycle.
    pub fn next(self) -> Self {
        match self {
            PaymentStatus::Unpaid => PaymentStatus::Paid,
            PaymentStatus::Paid => PaymentStatus::Exempted,
            PaymentStatus::Exempted => PaymentStatus::Unpaid,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "exempted" | "exempt" => Ok(PaymentStatus::Exempted),
            other => Err(HarvestError::UnknownStatus(other.to_string())),
        }
    }
}

impl ToSql for PaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: HarvestError| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalRecord {
    pub id: i64,
    pub tenant_name: String,
    pub tax_amount: f64,
    pub month: u32,
    pub year: i32,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub id: i64,
    pub action: String,
    pub created_at: NaiveDateTime,
}

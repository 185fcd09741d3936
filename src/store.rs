//! Row-level access to the record tables.
//!
//! Every page goes through these functions: list (with optional join, filter
//! and order), insert (single row or one batch), partial update by id and
//! delete by id. There is no caching; callers refetch after each write.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{HarvestError, Result};
use crate::models::{
    ActivityLog, Area, CoprasHarvest, CoprasRecord, Expense, FishpondCropping, PaymentStatus,
    RentalRecord, Sale, Tenant,
};
use crate::reports::project_next;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    ActivityLogs,
    Areas,
    CoprasRecords,
    FishpondCroppings,
    Tenants,
    RentalRecords,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::ActivityLogs => "activity_logs",
            Table::Areas => "areas",
            Table::CoprasRecords => "copras_records",
            Table::FishpondCroppings => "fishpond_croppings",
            Table::Tenants => "tenants",
            Table::RentalRecords => "rental_records",
        }
    }
}

/// Delete exactly one row by id.
pub fn delete(conn: &Connection, table: Table, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.as_str());
    let changed = conn.execute(&sql, [id])?;
    if changed == 0 {
        return Err(HarvestError::NotFound {
            table: table.as_str(),
            id,
        });
    }
    tracing::info!(table = table.as_str(), id, "deleted row");
    Ok(())
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------------------
// Areas
// ---------------------------------------------------------------------------

fn area_from_row(row: &Row<'_>) -> rusqlite::Result<Area> {
    Ok(Area {
        id: row.get(0)?,
        name: row.get(1)?,
        last_harvest_date: row.get(2)?,
        next_harvest_date: row.get(3)?,
        cycle_months: row.get(4)?,
    })
}

const AREA_COLUMNS: &str = "id, area_name, last_harvest_date, next_harvest_date, cycle_months";

pub fn add_area(conn: &Connection, name: &str, cycle_months: u32) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HarvestError::Validation("Area name is required".into()));
    }
    if cycle_months == 0 {
        return Err(HarvestError::Validation(
            "Harvest cycle must be at least one month".into(),
        ));
    }
    conn.execute(
        "INSERT INTO areas (area_name, cycle_months) VALUES (?1, ?2)",
        params![name, cycle_months],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name, cycle_months, "added area");
    Ok(id)
}

pub fn list_areas(conn: &Connection) -> Result<Vec<Area>> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM areas ORDER BY area_name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], area_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_area(conn: &Connection, id: i64) -> Result<Area> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = ?1");
    conn.query_row(&sql, [id], area_from_row)
        .optional()?
        .ok_or(HarvestError::NotFound {
            table: Table::Areas.as_str(),
            id,
        })
}

pub fn find_area(conn: &Connection, name: &str) -> Result<Area> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM areas WHERE area_name = ?1 COLLATE NOCASE");
    conn.query_row(&sql, [name.trim()], area_from_row)
        .optional()?
        .ok_or_else(|| HarvestError::UnknownArea(name.to_string()))
}

/// Record a harvest for an area and move its last/next harvest dates.
pub fn record_harvest(conn: &Connection, area_id: i64, date: NaiveDate) -> Result<Area> {
    let area = get_area(conn, area_id)?;
    let next = project_next(date, area.cycle_months).ok_or_else(|| {
        HarvestError::Validation(format!("Cannot project next harvest from {date}"))
    })?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO copras_harvests (area_id, harvest_date) VALUES (?1, ?2)",
        params![area_id, date],
    )?;
    tx.execute(
        "UPDATE areas SET last_harvest_date = ?1, next_harvest_date = ?2 WHERE id = ?3",
        params![date, next, area_id],
    )?;
    tx.commit()?;
    tracing::info!(area_id, %date, %next, "recorded harvest");

    Ok(Area {
        last_harvest_date: Some(date),
        next_harvest_date: Some(next),
        ..area
    })
}

pub fn list_harvests(conn: &Connection, area_id: Option<i64>) -> Result<Vec<CoprasHarvest>> {
    let mut stmt = conn.prepare(
        "SELECT id, area_id, harvest_date FROM copras_harvests \
         WHERE (?1 IS NULL OR area_id = ?1) ORDER BY harvest_date DESC, id DESC",
    )?;
    let rows = stmt.query_map([area_id], |row| {
        Ok(CoprasHarvest {
            id: row.get(0)?,
            area_id: row.get(1)?,
            harvest_date: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Copra records
// ---------------------------------------------------------------------------

/// A validated copra record ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CoprasDraft {
    pub date: NaiveDate,
    pub area_id: i64,
    pub farmer: String,
    pub sales: f64,
    pub expenses: f64,
    pub weight: f64,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct CoprasPatch {
    pub date: Option<NaiveDate>,
    pub area_id: Option<i64>,
    pub farmer: Option<String>,
    pub sales: Option<f64>,
    pub expenses: Option<f64>,
    pub weight: Option<f64>,
}

impl From<&CoprasDraft> for CoprasPatch {
    fn from(d: &CoprasDraft) -> Self {
        Self {
            date: Some(d.date),
            area_id: Some(d.area_id),
            farmer: Some(d.farmer.clone()),
            sales: Some(d.sales),
            expenses: Some(d.expenses),
            weight: Some(d.weight),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoprasFilter {
    pub area_id: Option<i64>,
}

const COPRAS_SELECT: &str = "SELECT r.id, r.date, r.area_id, a.area_name, r.farmer, r.sales, r.expenses, r.weight \
     FROM copras_records r LEFT JOIN areas a ON r.area_id = a.id";

fn copras_from_row(row: &Row<'_>) -> rusqlite::Result<CoprasRecord> {
    Ok(CoprasRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        area_id: row.get(2)?,
        area_name: row.get(3)?,
        farmer: row.get(4)?,
        sales: row.get(5)?,
        expenses: row.get(6)?,
        weight: row.get(7)?,
    })
}

pub fn list_copras(conn: &Connection, filter: &CoprasFilter) -> Result<Vec<CoprasRecord>> {
    let sql = format!(
        "{COPRAS_SELECT} WHERE (?1 IS NULL OR r.area_id = ?1) ORDER BY r.date DESC, r.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([filter.area_id], copras_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_copras(conn: &Connection, id: i64) -> Result<CoprasRecord> {
    let sql = format!("{COPRAS_SELECT} WHERE r.id = ?1");
    conn.query_row(&sql, [id], copras_from_row)
        .optional()?
        .ok_or(HarvestError::NotFound {
            table: Table::CoprasRecords.as_str(),
            id,
        })
}

pub fn insert_copras(conn: &Connection, draft: &CoprasDraft) -> Result<i64> {
    get_area(conn, draft.area_id)?;
    conn.execute(
        "INSERT INTO copras_records (date, area_id, farmer, sales, expenses, weight) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            draft.date,
            draft.area_id,
            draft.farmer,
            draft.sales,
            draft.expenses,
            draft.weight
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, farmer = %draft.farmer, "inserted copra record");
    Ok(id)
}

pub fn update_copras(conn: &Connection, id: i64, patch: &CoprasPatch) -> Result<()> {
    let current = get_copras(conn, id)?;
    if let Some(area_id) = patch.area_id {
        get_area(conn, area_id)?;
    }
    conn.execute(
        "UPDATE copras_records SET date = ?1, area_id = ?2, farmer = ?3, sales = ?4, expenses = ?5, weight = ?6 \
         WHERE id = ?7",
        params![
            patch.date.unwrap_or(current.date),
            patch.area_id.or(current.area_id),
            patch.farmer.as_deref().unwrap_or(&current.farmer),
            patch.sales.unwrap_or(current.sales),
            patch.expenses.unwrap_or(current.expenses),
            patch.weight.unwrap_or(current.weight),
            id
        ],
    )?;
    tracing::info!(id, "updated copra record");
    Ok(())
}

// ---------------------------------------------------------------------------
// Fishpond croppings
// ---------------------------------------------------------------------------

const CROPPING_SELECT: &str =
    "SELECT id, start_date, expenses, sales, completed, completed_at FROM fishpond_croppings";

fn cropping_from_row(row: &Row<'_>) -> rusqlite::Result<FishpondCropping> {
    Ok(FishpondCropping {
        id: row.get(0)?,
        start_date: row.get(1)?,
        expenses: json_column(row, 2)?,
        sales: json_column(row, 3)?,
        completed: row.get::<_, i64>(4)? != 0,
        completed_at: row.get(5)?,
    })
}

pub fn start_cropping(conn: &Connection, start_date: NaiveDate) -> Result<i64> {
    conn.execute(
        "INSERT INTO fishpond_croppings (start_date) VALUES (?1)",
        [start_date],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, %start_date, "started cropping");
    Ok(id)
}

pub fn list_croppings(conn: &Connection) -> Result<Vec<FishpondCropping>> {
    let sql = format!("{CROPPING_SELECT} ORDER BY start_date DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], cropping_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_cropping(conn: &Connection, id: i64) -> Result<FishpondCropping> {
    let sql = format!("{CROPPING_SELECT} WHERE id = ?1");
    conn.query_row(&sql, [id], cropping_from_row)
        .optional()?
        .ok_or(HarvestError::NotFound {
            table: Table::FishpondCroppings.as_str(),
            id,
        })
}

fn open_cropping(conn: &Connection, id: i64) -> Result<FishpondCropping> {
    let cropping = get_cropping(conn, id)?;
    if cropping.completed {
        return Err(HarvestError::CroppingCompleted(id));
    }
    Ok(cropping)
}

/// Append an expense to an open cropping's embedded list.
pub fn add_expense(conn: &Connection, id: i64, expense: Expense) -> Result<()> {
    let mut cropping = open_cropping(conn, id)?;
    cropping.expenses.push(expense);
    conn.execute(
        "UPDATE fishpond_croppings SET expenses = ?1 WHERE id = ?2",
        params![serde_json::to_string(&cropping.expenses)?, id],
    )?;
    tracing::info!(id, count = cropping.expenses.len(), "added cropping expense");
    Ok(())
}

/// Append a sale to an open cropping's embedded list.
pub fn add_sale(conn: &Connection, id: i64, sale: Sale) -> Result<()> {
    let mut cropping = open_cropping(conn, id)?;
    cropping.sales.push(sale);
    conn.execute(
        "UPDATE fishpond_croppings SET sales = ?1 WHERE id = ?2",
        params![serde_json::to_string(&cropping.sales)?, id],
    )?;
    tracing::info!(id, count = cropping.sales.len(), "added cropping sale");
    Ok(())
}

pub fn complete_cropping(conn: &Connection, id: i64, date: NaiveDate) -> Result<()> {
    let cropping = open_cropping(conn, id)?;
    if date < cropping.start_date {
        return Err(HarvestError::Validation(format!(
            "Completion date {date} is before the cropping start {}",
            cropping.start_date
        )));
    }
    conn.execute(
        "UPDATE fishpond_croppings SET completed = 1, completed_at = ?1 WHERE id = ?2",
        params![date, id],
    )?;
    tracing::info!(id, %date, "completed cropping");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tenants
// ---------------------------------------------------------------------------

pub fn add_tenant(conn: &Connection, name: &str, tax_amount: f64) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HarvestError::Validation("Tenant name is required".into()));
    }
    conn.execute(
        "INSERT INTO tenants (name, tax_amount) VALUES (?1, ?2)",
        params![name, tax_amount],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name, "added tenant");
    Ok(id)
}

pub fn list_tenants(conn: &Connection) -> Result<Vec<Tenant>> {
    let mut stmt = conn.prepare("SELECT id, name, tax_amount FROM tenants ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Tenant {
            id: row.get(0)?,
            name: row.get(1)?,
            tax_amount: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn find_tenant(conn: &Connection, name: &str) -> Result<Tenant> {
    conn.query_row(
        "SELECT id, name, tax_amount FROM tenants WHERE name = ?1 COLLATE NOCASE",
        [name.trim()],
        |row| {
            Ok(Tenant {
                id: row.get(0)?,
                name: row.get(1)?,
                tax_amount: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| HarvestError::UnknownTenant(name.to_string()))
}

// ---------------------------------------------------------------------------
// Rental records
// ---------------------------------------------------------------------------

/// One tenant row of a rental batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalDraft {
    pub tenant_name: String,
    pub tax_amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RentalFilter {
    pub transaction_id: Option<String>,
    pub year: Option<i32>,
}

fn rental_from_row(row: &Row<'_>) -> rusqlite::Result<RentalRecord> {
    Ok(RentalRecord {
        id: row.get(0)?,
        tenant_name: row.get(1)?,
        tax_amount: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        status: row.get(5)?,
        transaction_id: row.get(6)?,
    })
}

/// Years a rental collection may be recorded for.
pub const RENTAL_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

/// Insert every row of one rental transaction atomically. Returns the new
/// transaction id shared by all rows.
pub fn insert_rental_batch(
    conn: &Connection,
    month: u32,
    year: i32,
    rows: &[RentalDraft],
) -> Result<String> {
    if !(1..=12).contains(&month) {
        return Err(HarvestError::Validation(format!("Month must be 1-12, got {month}")));
    }
    if !RENTAL_YEARS.contains(&year) {
        return Err(HarvestError::Validation(format!("Invalid year: {year}")));
    }
    if rows.is_empty() {
        return Err(HarvestError::Validation(
            "A rental transaction needs at least one tenant".into(),
        ));
    }
    let transaction_id = uuid::Uuid::now_v7().to_string();

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO rental_records (tenant_name, tax_amount, month, year, status, transaction_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.tenant_name,
                row.tax_amount,
                month,
                year,
                row.status,
                transaction_id
            ])?;
        }
    }
    tx.commit()?;
    tracing::info!(%transaction_id, month, year, rows = rows.len(), "inserted rental batch");
    Ok(transaction_id)
}

pub fn list_rentals(conn: &Connection, filter: &RentalFilter) -> Result<Vec<RentalRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_name, tax_amount, month, year, status, transaction_id FROM rental_records \
         WHERE (?1 IS NULL OR transaction_id = ?1) AND (?2 IS NULL OR year = ?2) \
         ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(
        params![filter.transaction_id, filter.year],
        rental_from_row,
    )?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn set_rental_status(conn: &Connection, id: i64, status: PaymentStatus) -> Result<()> {
    let changed = conn.execute(
        "UPDATE rental_records SET status = ?1 WHERE id = ?2",
        params![status, id],
    )?;
    if changed == 0 {
        return Err(HarvestError::NotFound {
            table: Table::RentalRecords.as_str(),
            id,
        });
    }
    tracing::info!(id, %status, "updated rental status");
    Ok(())
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

pub fn add_log(conn: &Connection, action: &str) -> Result<i64> {
    let action = action.trim();
    if action.is_empty() {
        return Err(HarvestError::Validation("Activity text is required".into()));
    }
    conn.execute("INSERT INTO activity_logs (action) VALUES (?1)", [action])?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, "added activity log");
    Ok(id)
}

pub fn list_logs(conn: &Connection) -> Result<Vec<ActivityLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, action, created_at FROM activity_logs ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ActivityLog {
            id: row.get(0)?,
            action: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn count(conn: &Connection, table: Table) -> Result<i64> {
    let sql = format!("SELECT count(*) FROM {}", table.as_str());
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft(area_id: i64, farmer: &str, sales: f64, expenses: f64) -> CoprasDraft {
        CoprasDraft {
            date: date("2025-03-01"),
            area_id,
            farmer: farmer.to_string(),
            sales,
            expenses,
            weight: 100.0,
        }
    }

    #[test]
    fn test_copras_insert_list_joins_area() {
        let (_dir, conn) = test_db();
        let north = add_area(&conn, "North", 4).unwrap();
        insert_copras(&conn, &draft(north, "Ramon", 5000.0, 1200.0)).unwrap();
        let rows = list_copras(&conn, &CoprasFilter::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].area_name.as_deref(), Some("North"));
        assert_eq!(rows[0].farmer, "Ramon");
        assert_eq!(rows[0].price_per_kilo(), 50.0);
    }

    #[test]
    fn test_copras_filter_by_area() {
        let (_dir, conn) = test_db();
        let north = add_area(&conn, "North", 4).unwrap();
        let south = add_area(&conn, "South", 4).unwrap();
        insert_copras(&conn, &draft(north, "A", 1.0, 0.0)).unwrap();
        insert_copras(&conn, &draft(south, "B", 2.0, 0.0)).unwrap();
        insert_copras(&conn, &draft(south, "C", 3.0, 0.0)).unwrap();
        let rows = list_copras(&conn, &CoprasFilter { area_id: Some(south) }).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.area_id == Some(south)));
    }

    #[test]
    fn test_copras_insert_rejects_unknown_area() {
        let (_dir, conn) = test_db();
        let err = insert_copras(&conn, &draft(99, "A", 1.0, 0.0)).unwrap_err();
        assert!(matches!(err, HarvestError::NotFound { table: "areas", id: 99 }));
    }

    #[test]
    fn test_copras_partial_update_keeps_other_fields() {
        let (_dir, conn) = test_db();
        let north = add_area(&conn, "North", 4).unwrap();
        let id = insert_copras(&conn, &draft(north, "Ramon", 5000.0, 1200.0)).unwrap();
        update_copras(
            &conn,
            id,
            &CoprasPatch {
                sales: Some(6000.0),
                ..Default::default()
            },
        )
        .unwrap();
        let rec = get_copras(&conn, id).unwrap();
        assert_eq!(rec.sales, 6000.0);
        assert_eq!(rec.expenses, 1200.0);
        assert_eq!(rec.farmer, "Ramon");
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let (_dir, conn) = test_db();
        let err = update_copras(&conn, 7, &CoprasPatch::default()).unwrap_err();
        assert!(matches!(err, HarvestError::NotFound { .. }));
    }

    #[test]
    fn test_delete_removes_exactly_one_row() {
        let (_dir, conn) = test_db();
        let north = add_area(&conn, "North", 4).unwrap();
        let a = insert_copras(&conn, &draft(north, "A", 1.0, 0.0)).unwrap();
        let b = insert_copras(&conn, &draft(north, "B", 2.0, 0.0)).unwrap();
        let c = insert_copras(&conn, &draft(north, "C", 3.0, 0.0)).unwrap();

        delete(&conn, Table::CoprasRecords, b).unwrap();

        let ids: Vec<i64> = list_copras(&conn, &CoprasFilter::default())
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&c));
        assert!(!ids.contains(&b));
    }

    #[test]
    fn test_delete_unknown_id_is_not_found() {
        let (_dir, conn) = test_db();
        let err = delete(&conn, Table::ActivityLogs, 42).unwrap_err();
        assert_eq!(err.to_string(), "No activity_logs record with ID 42");
    }

    #[test]
    fn test_record_harvest_moves_area_dates() {
        let (_dir, conn) = test_db();
        let id = add_area(&conn, "North", 4).unwrap();
        let area = record_harvest(&conn, id, date("2025-01-15")).unwrap();
        assert_eq!(area.last_harvest_date, Some(date("2025-01-15")));
        assert_eq!(area.next_harvest_date, Some(date("2025-05-15")));

        let stored = get_area(&conn, id).unwrap();
        assert_eq!(stored, area);
        assert_eq!(list_harvests(&conn, Some(id)).unwrap().len(), 1);
    }

    #[test]
    fn test_add_area_validates() {
        let (_dir, conn) = test_db();
        assert!(add_area(&conn, "  ", 4).is_err());
        assert!(add_area(&conn, "North", 0).is_err());
        add_area(&conn, "North", 4).unwrap();
        assert!(matches!(add_area(&conn, "North", 4), Err(HarvestError::Db(_))));
        assert_eq!(find_area(&conn, "north").unwrap().name, "North");
        assert!(matches!(find_area(&conn, "East"), Err(HarvestError::UnknownArea(_))));
    }

    #[test]
    fn test_cropping_embedded_lists_roundtrip_in_order() {
        let (_dir, conn) = test_db();
        let id = start_cropping(&conn, date("2025-02-01")).unwrap();
        add_expense(
            &conn,
            id,
            Expense { name: "Fingerlings".into(), amount: 3000.0, date: date("2025-02-01") },
        )
        .unwrap();
        add_expense(
            &conn,
            id,
            Expense { name: "Feeds".into(), amount: 1500.0, date: date("2025-02-10") },
        )
        .unwrap();
        add_sale(&conn, id, Sale::new("Bangus", 12.5, 40.0, date("2025-05-01"))).unwrap();

        let c = get_cropping(&conn, id).unwrap();
        assert_eq!(c.expenses.len(), 2);
        assert_eq!(c.expenses[0].name, "Fingerlings");
        assert_eq!(c.expenses[1].name, "Feeds");
        assert_eq!(c.sales[0].total, 500.0);
        assert!(!c.completed);
    }

    #[test]
    fn test_sales_json_uses_camel_case_keys() {
        let (_dir, conn) = test_db();
        let id = start_cropping(&conn, date("2025-02-01")).unwrap();
        add_sale(&conn, id, Sale::new("Tilapia", 2.0, 90.0, date("2025-03-01"))).unwrap();
        let raw: String = conn
            .query_row("SELECT sales FROM fishpond_croppings WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert!(raw.contains("\"fishType\":\"Tilapia\""));
        assert!(raw.contains("\"pricePerKilo\":90.0"));
    }

    #[test]
    fn test_completed_cropping_rejects_new_entries() {
        let (_dir, conn) = test_db();
        let id = start_cropping(&conn, date("2025-02-01")).unwrap();
        complete_cropping(&conn, id, date("2025-06-01")).unwrap();
        let err = add_sale(&conn, id, Sale::new("Bangus", 1.0, 1.0, date("2025-06-02"))).unwrap_err();
        assert!(matches!(err, HarvestError::CroppingCompleted(i) if i == id));
        let c = get_cropping(&conn, id).unwrap();
        assert!(c.completed);
        assert_eq!(c.completed_at, Some(date("2025-06-01")));
    }

    #[test]
    fn test_complete_before_start_is_rejected() {
        let (_dir, conn) = test_db();
        let id = start_cropping(&conn, date("2025-02-01")).unwrap();
        assert!(complete_cropping(&conn, id, date("2025-01-01")).is_err());
        assert!(!get_cropping(&conn, id).unwrap().completed);
    }

    #[test]
    fn test_rental_batch_shares_transaction_and_period() {
        let (_dir, conn) = test_db();
        let rows = vec![
            RentalDraft { tenant_name: "Store A".into(), tax_amount: 100.0, status: PaymentStatus::Paid },
            RentalDraft { tenant_name: "Store B".into(), tax_amount: 150.0, status: PaymentStatus::Unpaid },
        ];
        let txn = insert_rental_batch(&conn, 3, 2025, &rows).unwrap();
        let stored = list_rentals(
            &conn,
            &RentalFilter { transaction_id: Some(txn.clone()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.transaction_id == txn && r.month == 3 && r.year == 2025));
        assert_eq!(stored[0].status, PaymentStatus::Paid);
        assert_eq!(stored[1].tenant_name, "Store B");
    }

    #[test]
    fn test_rental_batch_validates_month_and_rows() {
        let (_dir, conn) = test_db();
        let one = vec![RentalDraft {
            tenant_name: "A".into(),
            tax_amount: 1.0,
            status: PaymentStatus::Unpaid,
        }];
        assert!(insert_rental_batch(&conn, 13, 2025, &one).is_err());
        assert!(insert_rental_batch(&conn, 1, 2025, &[]).is_err());
        assert_eq!(count(&conn, Table::RentalRecords).unwrap(), 0);
    }

    #[test]
    fn test_rental_batch_rejects_implausible_year() {
        let (_dir, conn) = test_db();
        let one = vec![RentalDraft {
            tenant_name: "A".into(),
            tax_amount: 1.0,
            status: PaymentStatus::Unpaid,
        }];
        for year in [-42, 0, 1999, 2101, 99999] {
            let err = insert_rental_batch(&conn, 3, year, &one).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid year: {year}"));
        }
        assert_eq!(count(&conn, Table::RentalRecords).unwrap(), 0);
        assert!(insert_rental_batch(&conn, 3, 2000, &one).is_ok());
        assert!(insert_rental_batch(&conn, 3, 2100, &one).is_ok());
    }

    #[test]
    fn test_set_rental_status() {
        let (_dir, conn) = test_db();
        let txn = insert_rental_batch(
            &conn,
            1,
            2025,
            &[RentalDraft { tenant_name: "A".into(), tax_amount: 1.0, status: PaymentStatus::Unpaid }],
        )
        .unwrap();
        let row = &list_rentals(&conn, &RentalFilter { transaction_id: Some(txn), year: None })
            .unwrap()[0];
        set_rental_status(&conn, row.id, PaymentStatus::Exempted).unwrap();
        let again = &list_rentals(&conn, &RentalFilter::default()).unwrap()[0];
        assert_eq!(again.status, PaymentStatus::Exempted);
        assert!(set_rental_status(&conn, 999, PaymentStatus::Paid).is_err());
    }

    #[test]
    fn test_logs_add_list_delete() {
        let (_dir, conn) = test_db();
        assert!(add_log(&conn, "   ").is_err());
        let first = add_log(&conn, "Sprayed mango trees").unwrap();
        let second = add_log(&conn, "Paid pond caretaker").unwrap();
        let logs = list_logs(&conn).unwrap();
        assert_eq!(logs.len(), 2);
        // Same-second timestamps fall back to id order, newest first.
        assert_eq!(logs[0].id, second);
        delete(&conn, Table::ActivityLogs, first).unwrap();
        let logs = list_logs(&conn).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Paid pond caretaker");
    }
}

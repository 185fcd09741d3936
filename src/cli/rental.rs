use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::open_default;
use crate::error::Result;
use crate::fmt::{money, month_name};
use crate::models::PaymentStatus;
use crate::reports::group_transactions;
use crate::store::{self, RentalDraft, RentalFilter};

fn status_cell(status: PaymentStatus) -> Cell {
    match status {
        PaymentStatus::Paid => Cell::new(status.as_str().green()),
        PaymentStatus::Unpaid => Cell::new(status.as_str().red()),
        PaymentStatus::Exempted => Cell::new(status.as_str().dimmed()),
    }
}

/// Create one transaction covering every tenant. Tenants named in `paid` or
/// `exempt` get that status; everyone else starts unpaid.
pub fn collect(month: Option<u32>, year: Option<i32>, paid: &[String], exempt: &[String]) -> Result<()> {
    let conn = open_default()?;
    let today = chrono::Local::now().date_naive();
    let month = month.unwrap_or(today.month());
    let year = year.unwrap_or(today.year());

    let tenants = store::list_tenants(&conn)?;
    for name in paid.iter().chain(exempt) {
        store::find_tenant(&conn, name)?;
    }
    let named = |list: &[String], tenant: &str| list.iter().any(|n| n.trim().eq_ignore_ascii_case(tenant));

    let rows: Vec<RentalDraft> = tenants
        .iter()
        .map(|t| RentalDraft {
            tenant_name: t.name.clone(),
            tax_amount: t.tax_amount,
            status: if named(exempt, &t.name) {
                PaymentStatus::Exempted
            } else if named(paid, &t.name) {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Unpaid
            },
        })
        .collect();

    let transaction_id = store::insert_rental_batch(&conn, month, year, &rows)?;
    println!(
        "Recorded {} {year} collection for {} tenants (transaction {transaction_id})",
        month_name(month),
        rows.len()
    );
    Ok(())
}

pub fn set_status(id: i64, status: &str) -> Result<()> {
    let conn = open_default()?;
    let status: PaymentStatus = status.parse()?;
    store::set_rental_status(&conn, id, status)?;
    println!("Rental row {id} marked {status}");
    Ok(())
}

pub fn list(year: Option<i32>, transaction: Option<String>) -> Result<()> {
    let conn = open_default()?;
    let rows = store::list_rentals(
        &conn,
        &RentalFilter {
            transaction_id: transaction,
            year,
        },
    )?;
    let groups = group_transactions(&rows);
    if groups.is_empty() {
        println!("No rental collections recorded.");
        return Ok(());
    }

    for group in &groups {
        let mut table = Table::new();
        table.set_header(vec!["ID", "Tenant", "Tax", "Status"]);
        for row in &group.rows {
            table.add_row(vec![
                Cell::new(row.id),
                Cell::new(&row.tenant_name),
                Cell::new(money(row.tax_amount)),
                status_cell(row.status),
            ]);
        }
        println!(
            "{} {} ({})\n{table}",
            month_name(group.month),
            group.year,
            group.transaction_id
        );
        println!(
            "Collected {} of {}  Outstanding {}\n",
            money(group.collected),
            money(group.expected),
            money(group.outstanding())
        );
    }
    Ok(())
}

use rusqlite::Connection;

use crate::db::{get_connection, DB_FILE};
use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::models::NetSplit;
use crate::reports::{dashboard_summary, DashboardSummary};
use crate::settings::load_settings;
use crate::store::{self, CoprasFilter, RentalFilter, Table};

/// Fetch every table once and reduce it to the dashboard badges.
pub fn load_summary(conn: &Connection, split: NetSplit) -> Result<DashboardSummary> {
    let areas = store::list_areas(conn)?;
    let records = store::list_copras(conn, &CoprasFilter::default())?;
    let croppings = store::list_croppings(conn)?;
    let rentals = store::list_rentals(conn, &RentalFilter::default())?;
    let tenants = store::count(conn, Table::Tenants)? as usize;
    let logs = store::count(conn, Table::ActivityLogs)? as usize;
    Ok(dashboard_summary(
        &areas, &records, &croppings, tenants, &rentals, logs, split,
    ))
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    let owner = if settings.owner_name.is_empty() {
        "(not set)"
    } else {
        &settings.owner_name
    };
    println!("Owner:      {owner}");
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let s = load_summary(&conn, settings.net_split)?;

        println!();
        println!("Areas:              {}", s.areas);
        println!("Copra records:      {}", s.copras_records);
        println!("Copra net:          {}", money(s.copras_net));
        println!("Ongoing croppings:  {}", s.ongoing_croppings);
        println!("Completed:          {}", s.completed_croppings);
        println!("Tenants:            {}", s.tenants);
        println!("Open collections:   {}", s.open_transactions);
        println!("Outstanding rent:   {}", money(s.outstanding_rent));
        println!("Activity entries:   {}", s.activity_logs);
    } else {
        println!();
        println!("Database not found. Run `harvestbook init` to set up.");
    }

    Ok(())
}

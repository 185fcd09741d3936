use chrono::{Datelike, Local, Months, NaiveDate};
use rusqlite::Connection;

use crate::db::open_default;
use crate::error::Result;
use crate::models::{Expense, PaymentStatus, Sale};
use crate::store::{self, CoprasDraft, RentalDraft};

struct DemoArea {
    name: &'static str,
    cycle_months: u32,
}

const AREAS: &[DemoArea] = &[
    DemoArea { name: "Bukid Norte", cycle_months: 4 },
    DemoArea { name: "Lomboy", cycle_months: 4 },
    DemoArea { name: "Sapa", cycle_months: 3 },
];

/// Copra deliveries: (area index, months ago, farmer, sales, expenses, weight).
const COPRAS: &[(usize, u32, &str, f64, f64, f64)] = &[
    (0, 8, "Mang Tonyo", 18_400.0, 4_200.0, 460.0),
    (1, 8, "Aling Nena", 12_150.0, 3_100.0, 310.0),
    (2, 7, "Ramon", 9_800.0, 2_600.0, 245.0),
    (0, 4, "Mang Tonyo", 21_300.0, 4_650.0, 505.0),
    (1, 4, "Aling Nena", 13_900.0, 3_300.0, 335.0),
    (2, 4, "Ramon", 10_400.0, 2_450.0, 250.0),
    (2, 1, "Ramon", 11_050.0, 2_700.0, 260.0),
];

const TENANTS: &[(&str, f64)] = &[
    ("Sari-sari Store", 1_500.0),
    ("Rice Mill", 3_000.0),
    ("Boarding House", 2_200.0),
];

const MARKER: &str = "Bukid Norte";

fn months_ago(today: NaiveDate, months: u32) -> NaiveDate {
    today.checked_sub_months(Months::new(months)).unwrap_or(today)
}

fn insert_demo_data(conn: &Connection, today: NaiveDate) -> Result<usize> {
    let mut area_ids = Vec::new();
    for area in AREAS {
        area_ids.push(store::add_area(conn, area.name, area.cycle_months)?);
    }

    for &(area, ago, farmer, sales, expenses, weight) in COPRAS {
        store::insert_copras(
            conn,
            &CoprasDraft {
                date: months_ago(today, ago),
                area_id: area_ids[area],
                farmer: farmer.to_string(),
                sales,
                expenses,
                weight,
            },
        )?;
    }
    store::record_harvest(conn, area_ids[0], months_ago(today, 4))?;

    // One finished cropping and one still growing.
    let done = store::start_cropping(conn, months_ago(today, 9))?;
    store::add_expense(
        conn,
        done,
        Expense {
            name: "Fingerlings".into(),
            amount: 6_000.0,
            date: months_ago(today, 9),
        },
    )?;
    store::add_expense(
        conn,
        done,
        Expense {
            name: "Feeds".into(),
            amount: 14_500.0,
            date: months_ago(today, 7),
        },
    )?;
    store::add_sale(conn, done, Sale::new("Bangus", 420.0, 140.0, months_ago(today, 5)))?;
    store::add_sale(conn, done, Sale::new("Tilapia", 95.0, 110.0, months_ago(today, 5)))?;
    store::complete_cropping(conn, done, months_ago(today, 5))?;

    let ongoing = store::start_cropping(conn, months_ago(today, 2))?;
    store::add_expense(
        conn,
        ongoing,
        Expense {
            name: "Fingerlings".into(),
            amount: 6_500.0,
            date: months_ago(today, 2),
        },
    )?;

    for &(name, tax) in TENANTS {
        store::add_tenant(conn, name, tax)?;
    }
    for (ago, statuses) in [
        (2, [PaymentStatus::Paid, PaymentStatus::Paid, PaymentStatus::Exempted]),
        (1, [PaymentStatus::Paid, PaymentStatus::Unpaid, PaymentStatus::Unpaid]),
    ] {
        let period = months_ago(today, ago);
        let rows: Vec<RentalDraft> = TENANTS
            .iter()
            .zip(statuses)
            .map(|(&(name, tax), status)| RentalDraft {
                tenant_name: name.to_string(),
                tax_amount: tax,
                status,
            })
            .collect();
        store::insert_rental_batch(conn, period.month(), period.year(), &rows)?;
    }

    store::add_log(conn, "Cleaned the copra dryer")?;
    store::add_log(conn, "Repaired pond gate")?;

    Ok(COPRAS.len())
}

pub fn run() -> Result<()> {
    let conn = open_default()?;

    // Idempotency guard
    if store::find_area(&conn, MARKER).is_ok() {
        println!("Demo data already loaded (area '{MARKER}' exists).");
        return Ok(());
    }

    let records = insert_demo_data(&conn, Local::now().date_naive())?;

    println!("Demo data loaded!");
    println!("  Areas:          {}", AREAS.len());
    println!("  Copra records:  {records}");
    println!("  Croppings:      2");
    println!("  Tenants:        {}", TENANTS.len());
    println!();
    println!("Try these next:");
    println!("  harvestbook copras summary");
    println!("  harvestbook areas schedule");
    println!("  harvestbook fishpond list");
    println!("  harvestbook rental list");
    println!("  harvestbook");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::reports::{group_transactions, harvest_schedule};
    use crate::store::{CoprasFilter, RentalFilter};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_demo_creates_data() {
        let (_dir, conn) = test_db();
        let records = insert_demo_data(&conn, today()).unwrap();

        assert_eq!(store::list_areas(&conn).unwrap().len(), AREAS.len());
        assert_eq!(
            store::list_copras(&conn, &CoprasFilter::default()).unwrap().len(),
            records
        );
        let croppings = store::list_croppings(&conn).unwrap();
        assert_eq!(croppings.len(), 2);
        assert_eq!(croppings.iter().filter(|c| c.completed).count(), 1);
        assert_eq!(store::list_tenants(&conn).unwrap().len(), TENANTS.len());
    }

    #[test]
    fn test_demo_rental_rounds_group_by_transaction() {
        let (_dir, conn) = test_db();
        insert_demo_data(&conn, today()).unwrap();
        let rows = store::list_rentals(&conn, &RentalFilter::default()).unwrap();
        let groups = group_transactions(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].month, 8);
        assert_eq!(groups[0].collected, 4_500.0);
        assert!(!groups[0].is_open());
        assert!(groups[1].is_open());
    }

    #[test]
    fn test_demo_schedule_covers_every_area() {
        let (_dir, conn) = test_db();
        insert_demo_data(&conn, today()).unwrap();
        let areas = store::list_areas(&conn).unwrap();
        let records = store::list_copras(&conn, &CoprasFilter::default()).unwrap();
        let schedule = harvest_schedule(&areas, &records, 4, today());
        assert_eq!(schedule.len(), AREAS.len());
        assert!(schedule.iter().all(|p| p.next.is_some()));
    }

    #[test]
    fn test_demo_guard_marker_exists() {
        let (_dir, conn) = test_db();
        insert_demo_data(&conn, today()).unwrap();
        assert!(store::find_area(&conn, MARKER).is_ok());
    }
}

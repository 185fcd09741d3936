use std::io::Write;
use std::path::PathBuf;

use csv::Writer;

use crate::db::open_default;
use crate::error::Result;
use crate::models::{CoprasRecord, FishpondCropping, NetSplit, RentalRecord};
use crate::settings::{get_data_dir, load_settings};
use crate::store::{self, CoprasFilter, RentalFilter};

fn default_path(name: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("{name}-{date}.csv"))
}

fn open_output(output: Option<String>, name: &str) -> Result<(PathBuf, Writer<std::fs::File>)> {
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(name));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let wtr = Writer::from_path(&path)?;
    Ok((path, wtr))
}

fn finish(path: PathBuf, rows: usize) -> Result<String> {
    let shown = path.display().to_string();
    tracing::info!(path = %shown, rows, "exported csv");
    println!("Wrote {rows} rows to {shown}");
    Ok(shown)
}

pub fn write_copras<W: Write>(wtr: &mut Writer<W>, records: &[CoprasRecord], split: NetSplit) -> Result<()> {
    wtr.write_record([
        "id", "date", "area", "farmer", "sales", "expenses", "net_income", "weight", "price_per_kilo",
    ])?;
    for r in records {
        wtr.write_record([
            r.id.to_string(),
            r.date.to_string(),
            r.area_name.clone().unwrap_or_default(),
            r.farmer.clone(),
            format!("{:.2}", r.sales),
            format!("{:.2}", r.expenses),
            format!("{:.2}", r.net_income(split)),
            r.weight.to_string(),
            format!("{:.2}", r.price_per_kilo()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rentals<W: Write>(wtr: &mut Writer<W>, rows: &[RentalRecord]) -> Result<()> {
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One line per embedded expense or sale, tagged with its cropping.
pub fn write_fishpond<W: Write>(wtr: &mut Writer<W>, croppings: &[FishpondCropping]) -> Result<usize> {
    wtr.write_record([
        "cropping_id", "start_date", "kind", "date", "description", "kilos", "price_per_kilo", "amount",
    ])?;
    let mut lines = 0;
    for c in croppings {
        for e in &c.expenses {
            wtr.write_record([
                c.id.to_string(),
                c.start_date.to_string(),
                "expense".into(),
                e.date.to_string(),
                e.name.clone(),
                String::new(),
                String::new(),
                format!("{:.2}", e.amount),
            ])?;
            lines += 1;
        }
        for s in &c.sales {
            wtr.write_record([
                c.id.to_string(),
                c.start_date.to_string(),
                "sale".into(),
                s.date.to_string(),
                s.fish_type.clone(),
                s.kilos.to_string(),
                format!("{:.2}", s.price_per_kilo),
                format!("{:.2}", s.total),
            ])?;
            lines += 1;
        }
    }
    wtr.flush()?;
    Ok(lines)
}

pub fn copras(output: Option<String>) -> Result<String> {
    let conn = open_default()?;
    let records = store::list_copras(&conn, &CoprasFilter::default())?;
    let (path, mut wtr) = open_output(output, "copras")?;
    write_copras(&mut wtr, &records, load_settings().net_split)?;
    finish(path, records.len())
}

pub fn rental(output: Option<String>) -> Result<String> {
    let conn = open_default()?;
    let rows = store::list_rentals(&conn, &RentalFilter::default())?;
    let (path, mut wtr) = open_output(output, "rental")?;
    write_rentals(&mut wtr, &rows)?;
    finish(path, rows.len())
}

pub fn fishpond(output: Option<String>) -> Result<String> {
    let conn = open_default()?;
    let croppings = store::list_croppings(&conn)?;
    let (path, mut wtr) = open_output(output, "fishpond")?;
    let lines = write_fishpond(&mut wtr, &croppings)?;
    finish(path, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, PaymentStatus, Sale};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn output(wtr: Writer<Vec<u8>>) -> String {
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_copras_csv_applies_split() {
        let records = vec![CoprasRecord {
            id: 3,
            date: date("2025-04-02"),
            area_id: Some(1),
            area_name: Some("North".into()),
            farmer: "Ana".into(),
            sales: 1000.0,
            expenses: 200.0,
            weight: 50.0,
        }];
        let mut wtr = Writer::from_writer(vec![]);
        write_copras(&mut wtr, &records, NetSplit::Halved).unwrap();
        let text = output(wtr);
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,date,area"));
        assert_eq!(
            lines.next().unwrap(),
            "3,2025-04-02,North,Ana,1000.00,200.00,400.00,50,20.00"
        );
    }

    #[test]
    fn test_rental_csv_uses_field_names() {
        let rows = vec![RentalRecord {
            id: 1,
            tenant_name: "Reyes".into(),
            tax_amount: 100.0,
            month: 3,
            year: 2025,
            status: PaymentStatus::Paid,
            transaction_id: "T1".into(),
        }];
        let mut wtr = Writer::from_writer(vec![]);
        write_rentals(&mut wtr, &rows).unwrap();
        let text = output(wtr);
        assert_eq!(
            text.lines().next().unwrap(),
            "id,tenant_name,tax_amount,month,year,status,transaction_id"
        );
        assert!(text.contains("Reyes,100.0,3,2025,paid,T1"));
    }

    #[test]
    fn test_fishpond_csv_one_line_per_entry() {
        let croppings = vec![FishpondCropping {
            id: 2,
            start_date: date("2025-01-10"),
            expenses: vec![Expense {
                name: "Feeds".into(),
                amount: 300.0,
                date: date("2025-01-12"),
            }],
            sales: vec![Sale::new("Bangus", 12.5, 40.0, date("2025-04-01"))],
            completed: false,
            completed_at: None,
        }];
        let mut wtr = Writer::from_writer(vec![]);
        let lines = write_fishpond(&mut wtr, &croppings).unwrap();
        assert_eq!(lines, 2);
        let text = output(wtr);
        assert!(text.contains("2,2025-01-10,sale,2025-04-01,Bangus,12.5,40.00,500.00"));
    }
}

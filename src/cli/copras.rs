use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::amount::{parse_date, parse_optional_amount};
use crate::cli::date_or_today;
use crate::db::open_default;
use crate::error::{HarvestError, Result};
use crate::fmt::{kilos, money};
use crate::reports::{area_summaries, best_area, copras_totals, Metric};
use crate::settings::load_settings;
use crate::store::{self, CoprasDraft, CoprasFilter, CoprasPatch, Table as DbTable};

/// Raw command-line values; amounts stay text until parsed.
pub struct CoprasArgs {
    pub area: Option<String>,
    pub farmer: Option<String>,
    pub date: Option<String>,
    pub sales: Option<String>,
    pub expenses: Option<String>,
    pub weight: Option<String>,
}

pub fn add(args: &CoprasArgs) -> Result<()> {
    let conn = open_default()?;
    let area_name = args
        .area
        .as_deref()
        .ok_or_else(|| HarvestError::Validation("Area is required".into()))?;
    let area = store::find_area(&conn, area_name)?;
    let farmer = args.farmer.as_deref().unwrap_or("").trim().to_string();
    if farmer.is_empty() {
        return Err(HarvestError::Validation("Farmer is required".into()));
    }
    let draft = CoprasDraft {
        date: date_or_today(args.date.as_deref())?,
        area_id: area.id,
        farmer,
        sales: parse_optional_amount("Sales", args.sales.as_deref().unwrap_or(""))?,
        expenses: parse_optional_amount("Expenses", args.expenses.as_deref().unwrap_or(""))?,
        weight: parse_optional_amount("Weight", args.weight.as_deref().unwrap_or(""))?,
    };
    let id = store::insert_copras(&conn, &draft)?;
    println!(
        "Added copra record {id}: {} in {} on {}",
        draft.farmer, area.name, draft.date
    );
    Ok(())
}

pub fn edit(id: i64, args: &CoprasArgs) -> Result<()> {
    let conn = open_default()?;
    let area_id = match args.area.as_deref() {
        Some(name) => Some(store::find_area(&conn, name)?.id),
        None => None,
    };
    let farmer = match args.farmer.as_deref().map(str::trim) {
        Some("") => return Err(HarvestError::Validation("Farmer is required".into())),
        other => other.map(str::to_string),
    };
    let patch = CoprasPatch {
        date: args.date.as_deref().map(parse_date).transpose()?,
        area_id,
        farmer,
        sales: args
            .sales
            .as_deref()
            .map(|s| parse_optional_amount("Sales", s))
            .transpose()?,
        expenses: args
            .expenses
            .as_deref()
            .map(|s| parse_optional_amount("Expenses", s))
            .transpose()?,
        weight: args
            .weight
            .as_deref()
            .map(|s| parse_optional_amount("Weight", s))
            .transpose()?,
    };
    store::update_copras(&conn, id, &patch)?;
    println!("Updated copra record {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_default()?;
    store::delete(&conn, DbTable::CoprasRecords, id)?;
    println!("Deleted copra record {id}");
    Ok(())
}

pub fn list(area: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let split = load_settings().net_split;
    let filter = CoprasFilter {
        area_id: match area {
            Some(name) => Some(store::find_area(&conn, name)?.id),
            None => None,
        },
    };
    let records = store::list_copras(&conn, &filter)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "Area", "Farmer", "Sales", "Expenses", "Net", "Weight", "Price/kg",
    ]);
    for r in &records {
        let net = r.net_income(split);
        let net_cell = if net < 0.0 {
            Cell::new(money(net).red())
        } else {
            Cell::new(money(net))
        };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.date),
            Cell::new(r.area_name.as_deref().unwrap_or("-")),
            Cell::new(&r.farmer),
            Cell::new(money(r.sales)),
            Cell::new(money(r.expenses)),
            net_cell,
            Cell::new(kilos(r.weight)),
            Cell::new(money(r.price_per_kilo())),
        ]);
    }
    println!("Copra Records\n{table}");
    Ok(())
}

pub fn summary() -> Result<()> {
    let conn = open_default()?;
    let split = load_settings().net_split;
    let records = store::list_copras(&conn, &CoprasFilter::default())?;
    let totals = copras_totals(&records, split);
    let groups = area_summaries(&records, split);

    let mut table = Table::new();
    table.set_header(vec!["Area", "Records", "Sales", "Net"]);
    for g in &groups {
        table.add_row(vec![
            Cell::new(&g.name),
            Cell::new(g.records),
            Cell::new(money(g.sales)),
            Cell::new(money(g.net)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(records.len()),
        Cell::new(money(totals.sales)),
        Cell::new(money(totals.net)),
    ]);
    println!("Copra Summary ({split} net)\n{table}");

    println!("Total expenses:  {}", money(totals.expenses));
    match best_area(&groups, Metric::Sales) {
        Some(best) => println!("Best by sales:   {} ({})", best.name.green(), money(best.sales)),
        None => println!("Best by sales:   -"),
    }
    match best_area(&groups, Metric::Net) {
        Some(best) => println!("Best by net:     {} ({})", best.name.green(), money(best.net)),
        None => println!("Best by net:     -"),
    }
    Ok(())
}

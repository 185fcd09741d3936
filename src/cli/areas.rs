use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::date_or_today;
use crate::db::open_default;
use crate::error::Result;
use crate::reports::harvest_schedule;
use crate::settings::load_settings;
use crate::store::{self, CoprasFilter};

fn date_cell(date: Option<chrono::NaiveDate>) -> Cell {
    Cell::new(date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()))
}

pub fn add(name: &str, cycle_months: u32) -> Result<()> {
    let conn = open_default()?;
    let id = store::add_area(&conn, name, cycle_months)?;
    println!("Added area {id}: {} (every {cycle_months} months)", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_default()?;
    let areas = store::list_areas(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Area", "Cycle", "Last Harvest", "Next Harvest"]);
    for area in &areas {
        table.add_row(vec![
            Cell::new(area.id),
            Cell::new(&area.name),
            Cell::new(format!("{} mo", area.cycle_months)),
            date_cell(area.last_harvest_date),
            date_cell(area.next_harvest_date),
        ]);
    }
    println!("Areas\n{table}");
    Ok(())
}

pub fn harvest(area: &str, date: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let date = date_or_today(date)?;
    let area = store::find_area(&conn, area)?;
    let updated = store::record_harvest(&conn, area.id, date)?;
    let next = updated
        .next_harvest_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    println!("Recorded harvest for {} on {date}. Next harvest: {next}", updated.name);
    Ok(())
}

pub fn history(area: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let areas = store::list_areas(&conn)?;
    let area_id = match area {
        Some(name) => Some(store::find_area(&conn, name)?.id),
        None => None,
    };
    let harvests = store::list_harvests(&conn, area_id)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Area", "Harvest Date"]);
    for h in &harvests {
        let name = areas
            .iter()
            .find(|a| a.id == h.area_id)
            .map(|a| a.name.as_str())
            .unwrap_or("?");
        table.add_row(vec![
            Cell::new(h.id),
            Cell::new(name),
            Cell::new(h.harvest_date),
        ]);
    }
    println!("Harvest History\n{table}");
    Ok(())
}

pub fn schedule() -> Result<()> {
    let conn = open_default()?;
    let settings = load_settings();
    let areas = store::list_areas(&conn)?;
    let records = store::list_copras(&conn, &CoprasFilter::default())?;
    let today = chrono::Local::now().date_naive();
    let projections = harvest_schedule(&areas, &records, settings.harvest_offset_months, today);

    let mut table = Table::new();
    table.set_header(vec!["Area", "Last Harvest", "Next Harvest", "Days Left"]);
    for p in &projections {
        let days = match p.days_until {
            Some(d) if d < 0 => Cell::new(format!("{} overdue", -d).red()),
            Some(0) => Cell::new("today".yellow()),
            Some(d) => Cell::new(d),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(&p.name),
            date_cell(p.last),
            date_cell(p.next),
            days,
        ]);
    }
    println!("Harvest Schedule\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_default()?;
    let area = store::get_area(&conn, id)?;
    store::delete(&conn, store::Table::Areas, id)?;
    println!("Deleted area {id}: {}", area.name);
    Ok(())
}

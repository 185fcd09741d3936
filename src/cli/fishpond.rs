use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::amount::parse_amount;
use crate::cli::date_or_today;
use crate::db::open_default;
use crate::error::{HarvestError, Result};
use crate::fmt::{kilos, long_date, money};
use crate::models::{Expense, Sale};
use crate::reports::{cropping_age, cropping_totals};
use crate::store::{self, Table as DbTable};

pub fn start(date: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let date = date_or_today(date)?;
    let id = store::start_cropping(&conn, date)?;
    println!("Started cropping {id} on {}", long_date(date));
    Ok(())
}

pub fn expense(id: i64, name: &str, amount: &str, date: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(HarvestError::Validation("Expense name is required".into()));
    }
    let expense = Expense {
        name: name.to_string(),
        amount: parse_amount("Amount", amount)?,
        date: date_or_today(date)?,
    };
    let amount = expense.amount;
    store::add_expense(&conn, id, expense)?;
    println!("Added expense to cropping {id}: {name} {}", money(amount));
    Ok(())
}

pub fn sale(id: i64, fish_type: &str, kilos_in: &str, price: &str, date: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let fish_type = fish_type.trim();
    if fish_type.is_empty() {
        return Err(HarvestError::Validation("Fish type is required".into()));
    }
    let sale = Sale::new(
        fish_type,
        parse_amount("Kilos", kilos_in)?,
        parse_amount("Price per kilo", price)?,
        date_or_today(date)?,
    );
    let line = format!(
        "{} kg {fish_type} at {} = {}",
        kilos(sale.kilos),
        money(sale.price_per_kilo),
        money(sale.total)
    );
    store::add_sale(&conn, id, sale)?;
    println!("Added sale to cropping {id}: {line}");
    Ok(())
}

pub fn complete(id: i64, date: Option<&str>) -> Result<()> {
    let conn = open_default()?;
    let date = date_or_today(date)?;
    store::complete_cropping(&conn, id, date)?;
    let cropping = store::get_cropping(&conn, id)?;
    let totals = cropping_totals(&cropping);
    println!(
        "Completed cropping {id} after {} days. Net: {}",
        cropping_age(&cropping, date),
        money(totals.net)
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_default()?;
    store::delete(&conn, DbTable::FishpondCroppings, id)?;
    println!("Deleted cropping {id}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_default()?;
    let croppings = store::list_croppings(&conn)?;
    let today = chrono::Local::now().date_naive();

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Started", "Status", "Days", "Expenses", "Sales", "Net",
    ]);
    for c in &croppings {
        let totals = cropping_totals(c);
        let status = match c.completed_at {
            Some(done) if c.completed => Cell::new(format!("completed {done}").dimmed()),
            _ => Cell::new("ongoing".green()),
        };
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(c.start_date),
            status,
            Cell::new(cropping_age(c, today)),
            Cell::new(money(totals.expenses)),
            Cell::new(money(totals.sales)),
            Cell::new(money(totals.net)),
        ]);
    }
    println!("Fishpond Croppings\n{table}");
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = open_default()?;
    let cropping = store::get_cropping(&conn, id)?;
    let totals = cropping_totals(&cropping);

    println!("Cropping {id}, started {}", long_date(cropping.start_date));
    if let Some(done) = cropping.completed_at {
        println!("Completed {}", long_date(done));
    }

    let mut expenses = Table::new();
    expenses.set_header(vec!["Date", "Expense", "Amount"]);
    for e in &cropping.expenses {
        expenses.add_row(vec![
            Cell::new(e.date),
            Cell::new(&e.name),
            Cell::new(money(e.amount)),
        ]);
    }
    println!("\nExpenses\n{expenses}");

    let mut sales = Table::new();
    sales.set_header(vec!["Date", "Fish", "Kilos", "Price/kg", "Total"]);
    for s in &cropping.sales {
        sales.add_row(vec![
            Cell::new(s.date),
            Cell::new(&s.fish_type),
            Cell::new(kilos(s.kilos)),
            Cell::new(money(s.price_per_kilo)),
            Cell::new(money(s.total)),
        ]);
    }
    println!("\nSales\n{sales}");

    println!(
        "\nExpenses {}  Sales {}  Net {}",
        money(totals.expenses),
        money(totals.sales),
        money(totals.net)
    );
    Ok(())
}

use comfy_table::{Cell, Table};

use crate::amount::parse_optional_amount;
use crate::db::open_default;
use crate::error::Result;
use crate::fmt::money;
use crate::store::{self, Table as DbTable};

pub fn add(name: &str, tax: &str) -> Result<()> {
    let conn = open_default()?;
    let tax = parse_optional_amount("Tax amount", tax)?;
    let id = store::add_tenant(&conn, name, tax)?;
    println!("Added tenant {id}: {} ({})", name.trim(), money(tax));
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_default()?;
    let tenants = store::list_tenants(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Tenant", "Tax Amount"]);
    for t in &tenants {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.name),
            Cell::new(money(t.tax_amount)),
        ]);
    }
    println!("Tenants\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_default()?;
    store::delete(&conn, DbTable::Tenants, id)?;
    println!("Deleted tenant {id}");
    Ok(())
}

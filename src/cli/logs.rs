use comfy_table::{Cell, Table};

use crate::db::open_default;
use crate::error::Result;
use crate::store::{self, Table as DbTable};

pub fn add(action: &str) -> Result<()> {
    let conn = open_default()?;
    let id = store::add_log(&conn, action)?;
    println!("Logged activity {id}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_default()?;
    let logs = store::list_logs(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "When", "Activity"]);
    for log in &logs {
        table.add_row(vec![
            Cell::new(log.id),
            Cell::new(log.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&log.action),
        ]);
    }
    println!("Activity Log\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_default()?;
    store::delete(&conn, DbTable::ActivityLogs, id)?;
    println!("Deleted activity {id}");
    Ok(())
}

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "harvestbook.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS areas (
    id INTEGER PRIMARY KEY,
    area_name TEXT NOT NULL UNIQUE,
    last_harvest_date TEXT,
    next_harvest_date TEXT,
    cycle_months INTEGER NOT NULL DEFAULT 4,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS copras_records (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    area_id INTEGER,
    farmer TEXT NOT NULL,
    sales REAL NOT NULL DEFAULT 0,
    expenses REAL NOT NULL DEFAULT 0,
    weight REAL NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (area_id) REFERENCES areas(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS copras_harvests (
    id INTEGER PRIMARY KEY,
    area_id INTEGER NOT NULL,
    harvest_date TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (area_id) REFERENCES areas(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS fishpond_croppings (
    id INTEGER PRIMARY KEY,
    start_date TEXT NOT NULL,
    expenses TEXT NOT NULL DEFAULT '[]',
    sales TEXT NOT NULL DEFAULT '[]',
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tenants (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    tax_amount REAL NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS rental_records (
    id INTEGER PRIMARY KEY,
    tenant_name TEXT NOT NULL,
    tax_amount REAL NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'unpaid',
    transaction_id TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_rental_records_txn ON rental_records(transaction_id);

CREATE TABLE IF NOT EXISTS activity_logs (
    id INTEGER PRIMARY KEY,
    action TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open the database in the configured data directory, creating tables on demand.
pub fn open_default() -> Result<Connection> {
    let data_dir = crate::settings::get_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let conn = get_connection(&data_dir.join(DB_FILE))?;
    init_db(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "activity_logs",
            "areas",
            "copras_records",
            "copras_harvests",
            "fishpond_croppings",
            "tenants",
            "rental_records",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_area_cycle_defaults_to_four_months() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO areas (area_name) VALUES ('North')", []).unwrap();
        let months: i64 = conn
            .query_row("SELECT cycle_months FROM areas WHERE area_name = 'North'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(months, 4);
    }
}

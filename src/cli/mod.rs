pub mod areas;
pub mod backup;
pub mod config;
pub mod copras;
pub mod copras_manager;
pub mod dashboard;
pub mod demo;
pub mod export;
pub mod fishpond;
pub mod fishpond_manager;
pub mod init;
pub mod load;
pub mod log_manager;
pub mod logs;
pub mod rental;
pub mod rental_manager;
pub mod status;
pub mod tenants;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::amount::parse_date;
use crate::error::Result;

/// `--date` values default to today when omitted.
pub(crate) fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => parse_date(d),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[derive(Parser)]
#[command(
    name = "harvestbook",
    about = "Farm record keeping for copra, fishpond and rental income."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up harvestbook: choose a data directory and initialize the database.
    Init {
        /// Path for harvestbook data (default: ~/Documents/harvestbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Owner name shown in the dashboard greeting
        #[arg(long)]
        owner: Option<String>,
    },
    /// Manage coconut areas and their harvest cycles.
    Areas {
        #[command(subcommand)]
        command: AreasCommands,
    },
    /// Copra sales records.
    Copras {
        #[command(subcommand)]
        command: CoprasCommands,
    },
    /// Fishpond croppings, their expenses and sales.
    Fishpond {
        #[command(subcommand)]
        command: FishpondCommands,
    },
    /// Manage rental tenants.
    Tenants {
        #[command(subcommand)]
        command: TenantsCommands,
    },
    /// Rental tax collection rounds.
    Rental {
        #[command(subcommand)]
        command: RentalCommands,
    },
    /// Free-text activity log.
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Export records to CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Load sample areas, records, croppings and tenants.
    Demo,
    /// Switch to an existing harvestbook data directory.
    Load {
        /// Path to data directory containing harvestbook.db
        path: String,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/harvestbook-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the current database and a summary of each line of business.
    Status,
}

#[derive(Subcommand)]
pub enum AreasCommands {
    /// Add an area.
    Add {
        /// Area name, e.g. 'North Grove'
        name: String,
        /// Months between harvests
        #[arg(long = "cycle-months", default_value = "4")]
        cycle_months: u32,
    },
    /// List all areas with their last and next harvest dates.
    List,
    /// Record a harvest and advance the area's next harvest date.
    Harvest {
        /// Area name
        area: String,
        /// Harvest date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show recorded harvests, optionally for one area.
    History {
        /// Area name
        area: Option<String>,
    },
    /// Project the next harvest of every area from its copra records.
    Schedule,
    /// Delete an area by ID. Its copra records keep their figures.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum CoprasCommands {
    /// Add a copra record.
    Add {
        /// Area name
        #[arg(long)]
        area: String,
        /// Farmer name
        #[arg(long)]
        farmer: String,
        /// Record date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Sales amount
        #[arg(long, default_value = "")]
        sales: String,
        /// Expenses amount
        #[arg(long, default_value = "")]
        expenses: String,
        /// Weight in kilos
        #[arg(long, default_value = "")]
        weight: String,
    },
    /// Edit fields of an existing record.
    Edit {
        /// Record ID (shown in `harvestbook copras list`)
        id: i64,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        farmer: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        sales: Option<String>,
        #[arg(long)]
        expenses: Option<String>,
        #[arg(long)]
        weight: Option<String>,
    },
    /// Delete a record by ID.
    Delete { id: i64 },
    /// List records, newest first.
    List {
        /// Only records for this area
        #[arg(long)]
        area: Option<String>,
    },
    /// Totals, per-area figures and the best performing area.
    Summary,
}

#[derive(Subcommand)]
pub enum FishpondCommands {
    /// Start a new cropping.
    Start {
        /// Start date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Add an expense to an ongoing cropping.
    Expense {
        /// Cropping ID
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Add a fish sale to an ongoing cropping.
    Sale {
        /// Cropping ID
        id: i64,
        #[arg(long = "fish-type")]
        fish_type: String,
        #[arg(long)]
        kilos: String,
        /// Price per kilo
        #[arg(long)]
        price: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark a cropping as completed.
    Complete {
        /// Cropping ID
        id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a cropping by ID.
    Delete { id: i64 },
    /// List croppings with their totals.
    List,
    /// Show one cropping's expenses and sales.
    Show { id: i64 },
}

#[derive(Subcommand)]
pub enum TenantsCommands {
    /// Add a tenant.
    Add {
        name: String,
        /// Tax amount due each collection round
        #[arg(long, default_value = "")]
        tax: String,
    },
    /// List tenants.
    List,
    /// Delete a tenant by ID.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RentalCommands {
    /// Record one collection round for every tenant.
    Collect {
        /// Month number 1-12 (default: current month)
        #[arg(long)]
        month: Option<u32>,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Tenants who paid (repeatable)
        #[arg(long)]
        paid: Vec<String>,
        /// Tenants exempted this round (repeatable)
        #[arg(long)]
        exempt: Vec<String>,
    },
    /// Set the payment status of one rental row.
    Status {
        /// Rental row ID (shown in `harvestbook rental list`)
        id: i64,
        /// unpaid, paid or exempted
        status: String,
    },
    /// List collection rounds grouped by transaction.
    List {
        #[arg(long)]
        year: Option<i32>,
        /// Only this transaction ID
        #[arg(long)]
        transaction: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// Add an activity entry.
    Add { action: String },
    /// List activity, newest first.
    List,
    /// Delete an entry by ID.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export copra records.
    Copras {
        #[arg(long)]
        output: Option<String>,
    },
    /// Export rental records.
    Rental {
        #[arg(long)]
        output: Option<String>,
    },
    /// Export fishpond expenses and sales, one line per entry.
    Fishpond {
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings.
    Show,
    /// How copra net income is reported: full or halved.
    SetSplit { split: String },
    /// Months added to the last copra record date to project the next harvest.
    SetOffset { months: u32 },
    /// Owner name for the dashboard greeting.
    SetOwner { name: String },
}

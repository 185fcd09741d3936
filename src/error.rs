use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid amount for {field}: '{input}'")]
    InvalidAmount { field: String, input: String },

    #[error("Invalid date: '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("No {table} record with ID {id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("Unknown area: {0}")]
    UnknownArea(String),

    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("Unknown payment status: {0} (expected unpaid, paid or exempted)")]
    UnknownStatus(String),

    #[error("Cropping {0} is completed; no more expenses or sales can be added")]
    CroppingCompleted(i64),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;

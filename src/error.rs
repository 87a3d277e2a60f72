use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookkeeperError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Unknown AP/AR item: {0}")]
    UnknownItem(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("No rows could be parsed from {0}")]
    EmptyImport(String),

    #[error("Could not save ledger changes: {0}")]
    Persistence(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BookkeeperError>;

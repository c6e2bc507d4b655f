use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurseError {
    #[error("Currency purse is not initialized")]
    Uninitialized,

    #[error("Invalid transaction amount: {value}")]
    InvalidAmount { value: f64 },

    #[error("Invalid currency level ordinal: {0}")]
    InvalidLevel(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PurseResult<T> = Result<T, PurseError>;

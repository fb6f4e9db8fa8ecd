use thiserror::Error;

#[derive(Error, Debug)]
pub enum KanriError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Fiscal term {index} not found")]
    TermNotFound { index: u32 },

    #[error("Division '{name}' not found")]
    DivisionNotFound { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type KanriResult<T> = Result<T, KanriError>;

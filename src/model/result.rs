use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of records in `{0}`")]
    NotAnArray(String),

    #[error("Not a valid reference date: {0}")]
    InvalidReferenceDate(String),

    #[error("Not a valid workforce mode: {0} (expected full, common or both)")]
    InvalidWorkforceMode(String),

    #[error("No data source was supplied (or every source is empty)")]
    NoDataSources,

    #[error("Markdown rendering failed: {0}")]
    Markdown(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatouraError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown invoice: {0}")]
    UnknownInvoice(String),

    #[error("Unknown quote: {0}")]
    UnknownQuote(String),

    #[error("Unknown bank transaction: {0}")]
    UnknownTransaction(i64),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid VAT rate: {0} (expected one of 0, 7, 10, 14, 20)")]
    InvalidVatRate(f64),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FatouraError>;

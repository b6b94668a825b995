//! Error types for the inventory ledger.

use crate::types::ProductId;
use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Data directory is locked by another process")]
    Locked,

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(e: csv::Error) -> Self {
        LedgerError::Table(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

//! Error types for table editing

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Geometry does not match the table: {0}")]
    GeometryMismatch(String),

    #[error("Table model error: {0}")]
    Model(#[from] table_model::TableModelError),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditError>;

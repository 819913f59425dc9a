//! Errors raised by the commitment, circuit and setup-selection layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("dataset is empty: at least one row is required")]
    EmptyDataset,

    #[error("value cannot be mapped into the hash domain: {0}")]
    HashDomain(String),

    #[error("invalid tree shape: {num_rows} rows over {num_leaves} leaves")]
    InvalidShape { num_rows: usize, num_leaves: usize },

    #[error("no setup parameters for {required} constraints (largest capacity: {largest})")]
    NoSuitableParameters { required: u64, largest: String },

    #[error("missing circuit input: {0}")]
    MissingInput(String),

    #[error("invalid decimal integer: {0:?}")]
    InvalidDecimal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ZkError>;

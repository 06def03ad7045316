use thiserror::Error;

use crate::models::Provider;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Provider {0} is not configured, run the setup command first")]
    NotConfigured(Provider),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid Input: {0}")]
    Validation(String),

    #[error("Remote Service Error: {0}")]
    RemoteService(String),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

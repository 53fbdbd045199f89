use thiserror::Error;

use crate::model::{ContractStatus, DocumentId, FieldId};

/// Errors raised by field placement operations.
///
/// Everything except [`FieldError::Persistence`] is a local invariant
/// violation and is raised before any store mutation or network call.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Invalid geometry: {width}x{height} (width and height must be positive)")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("Unknown field: {0}")]
    UnknownField(FieldId),

    #[error("Invalid page spec {spec:?}: {reason}")]
    InvalidPageSpec { spec: String, reason: String },

    #[error("Contract is not editable (status: {0})")]
    ContractNotEditable(ContractStatus),

    #[error("A drag session is already active for field {0}")]
    SessionBusy(FieldId),

    #[error("No active drag session")]
    NoActiveSession,

    #[error("Persistence failure: {0}")]
    Persistence(#[from] BackendError),
}

/// Errors surfaced by the persistence boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode server payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FieldError>;

//! Error types for the contractsign API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contractsign_core::{ContractStatus, FieldError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Contract is {0}; fields can only change while it is a draft")]
    ContractLocked(ContractStatus),

    #[error("{0}")]
    NotReady(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::ContractNotEditable(status) => ApiError::ContractLocked(status),
            FieldError::UnknownDocument(id) => ApiError::DocumentNotFound(id.to_string()),
            FieldError::UnknownField(id) => ApiError::FieldNotFound(id.to_string()),
            FieldError::InvalidGeometry { .. } | FieldError::InvalidPageSpec { .. } => {
                ApiError::InvalidRequest(err.to_string())
            }
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ContractNotFound(_)
            | ApiError::DocumentNotFound(_)
            | ApiError::FieldNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ContractLocked(_) => StatusCode::CONFLICT,
            ApiError::NotReady(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Storage and internal failures stay in
    /// the server log.
    fn client_message(&self) -> String {
        match self {
            ApiError::NotReady(msg) | ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::Database(_) => "Database error".to_string(),
            ApiError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }

        let body = Json(json!({
            "error": self.client_message(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractsign_core::DocumentId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_errors_map_to_statuses() {
        let cases = [
            (
                ApiError::from(FieldError::ContractNotEditable(ContractStatus::Sent)),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(FieldError::UnknownDocument(DocumentId::from("d9"))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(FieldError::InvalidGeometry {
                    width: 0.0,
                    height: 10.0,
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_internal_details_stay_out_of_body() {
        let err = ApiError::Internal(anyhow::anyhow!("disk on fire at /var/db"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal error");
        assert_eq!(
            ApiError::NotReady("Signer s1 has no signature field".into()).client_message(),
            "Signer s1 has no signature field"
        );
    }
}

//! Request, response and row types for the contractsign API
//!
//! Field, contract and signer payloads reuse the records of
//! [`contractsign_core::wire`] so both sides agree on one wire format.

use contractsign_core::wire::SignerRecord;
use contractsign_core::{FieldId, Readiness, SignerRole};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Seed a draft contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub title: String,
    pub documents: Vec<NewDocument>,
    #[serde(default)]
    pub signers: Vec<NewSigner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub filename: String,
    #[serde(default)]
    pub original_path: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSigner {
    pub name: String,
    pub email: String,
    #[serde(default = "default_signer_type")]
    pub signer_type: SignerRole,
}

fn default_signer_type() -> SignerRole {
    SignerRole::Signer
}

/// `DELETE /api/fields?fieldId=`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFieldQuery {
    pub field_id: FieldId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFieldResponse {
    /// False when the field was already gone
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub ready: bool,
    pub missing_signers: Vec<SignerRecord>,
    pub message: Option<String>,
}

impl From<Readiness> for ReadinessResponse {
    fn from(readiness: Readiness) -> Self {
        Self {
            ready: readiness.is_ready(),
            missing_signers: readiness
                .missing_signers()
                .iter()
                .map(SignerRecord::from)
                .collect(),
            message: readiness.warning_message(),
        }
    }
}

// ============================================================
// Database rows
// ============================================================

#[derive(Debug, FromRow)]
pub struct ContractRow {
    pub id: String,
    pub title: String,
    pub status: String,
}

#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub filename: String,
    pub original_path: String,
    pub page_count: i64,
}

#[derive(Debug, FromRow)]
pub struct SignerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub signer_type: String,
}

#[derive(Debug, FromRow)]
pub struct FieldRow {
    pub id: String,
    pub document_id: String,
    pub signer_id: Option<String>,
    pub field_type: String,
    pub pages: String,
    pub position: String,
    pub size: String,
    pub content: Option<String>,
}

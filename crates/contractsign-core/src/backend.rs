//! Persistence boundary consumed by the field service

use async_trait::async_trait;

use crate::error::BackendError;
use crate::model::{Contract, ContractId, ContractStatus, Field, FieldId};
use crate::store::FieldPatch;

/// A contract and all of its fields as the server currently sees them
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSnapshot {
    pub contract: Contract,
    pub fields: Vec<Field>,
}

/// Field persistence and the contract send transition.
///
/// Implementations deal in decoded domain types; any wire encoding stays
/// inside the implementation.
#[async_trait]
pub trait FieldBackend: Send + Sync {
    async fn fetch_contract(&self, contract_id: &ContractId)
        -> Result<ContractSnapshot, BackendError>;

    /// Persist a new field. The returned field carries the server-assigned id.
    async fn create_field(&self, field: &Field) -> Result<Field, BackendError>;

    /// Apply a partial update; only attributes present in `patch` change
    async fn update_field(&self, field_id: &FieldId, patch: &FieldPatch)
        -> Result<Field, BackendError>;

    /// Idempotent removal
    async fn delete_field(&self, field_id: &FieldId) -> Result<(), BackendError>;

    /// Move the contract out of draft. Returns the new status.
    async fn send_contract(&self, contract_id: &ContractId)
        -> Result<ContractStatus, BackendError>;
}

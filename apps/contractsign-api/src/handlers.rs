//! HTTP handlers for the contractsign API
//!
//! Field mutations are validated by replaying them against a
//! [`FieldStore`] built from the stored contract, so the server enforces the
//! same invariants as the editing client.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use contractsign_core::wire::{
    ContractRecord, CreateFieldRequest, FieldRecord, SendResponse, UpdateFieldRequest,
};
use contractsign_core::{
    check_readiness, Contract, ContractId, ContractStatus, Document, DocumentId, FieldId,
    FieldStore, Readiness, Signer, SignerId,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Seed a draft contract with its documents and signers
pub async fn create_contract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContractRequest>,
) -> Result<Json<ContractRecord>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Title is required".to_string()));
    }
    if req.documents.is_empty() {
        return Err(ApiError::InvalidRequest(
            "A contract needs at least one document".to_string(),
        ));
    }
    if let Some(doc) = req.documents.iter().find(|d| d.page_count == 0) {
        return Err(ApiError::InvalidRequest(format!(
            "Document {} has no pages",
            doc.filename
        )));
    }

    let contract = Contract {
        id: ContractId::new(Uuid::new_v4().to_string()),
        title: req.title,
        status: ContractStatus::Draft,
        documents: req
            .documents
            .into_iter()
            .map(|d| Document {
                id: DocumentId::new(Uuid::new_v4().to_string()),
                filename: d.filename,
                original_path: d.original_path,
                page_count: d.page_count,
            })
            .collect(),
        signers: req
            .signers
            .into_iter()
            .map(|s| Signer {
                id: SignerId::new(Uuid::new_v4().to_string()),
                name: s.name,
                email: s.email,
                role: s.signer_type,
            })
            .collect(),
    };

    db::insert_contract(&state.db, &contract).await?;
    info!("Created contract: {}", contract.id);

    Ok(Json(ContractRecord::from_parts(&contract, &[])))
}

/// Contract with documents, their fields, and signers
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContractRecord>, ApiError> {
    let snapshot = db::load_snapshot(&state.db, &ContractId::new(id)).await?;
    Ok(Json(ContractRecord::from_parts(
        &snapshot.contract,
        &snapshot.fields,
    )))
}

pub async fn get_readiness(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    let snapshot = db::load_snapshot(&state.db, &ContractId::new(id)).await?;
    let store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
    Ok(Json(
        check_readiness(&snapshot.contract.signers, &store).into(),
    ))
}

pub async fn create_field(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFieldRequest>,
) -> Result<Json<FieldRecord>, ApiError> {
    let new = req
        .into_new_field()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let contract_id = db::contract_of_document(&state.db, &new.document_id)
        .await?
        .ok_or_else(|| ApiError::DocumentNotFound(new.document_id.to_string()))?;

    let snapshot = db::load_snapshot(&state.db, &contract_id).await?;
    check_signer(&snapshot.contract, new.signer_id.as_ref())?;

    let mut store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
    let temporary = store.create(new)?;
    let id = FieldId::new(Uuid::new_v4().to_string());
    store.reconcile_id(&temporary, id.clone())?;
    let field = store
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::FieldNotFound(id.to_string()))?;

    db::insert_field(&state.db, &field).await?;
    debug!(field = %field.id, document = %field.document_id, "field created");

    Ok(Json(FieldRecord::from_field(&field)))
}

pub async fn update_field(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateFieldRequest>,
) -> Result<Json<FieldRecord>, ApiError> {
    let (field_id, patch) = req
        .into_patch()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let contract_id = db::contract_of_field(&state.db, &field_id)
        .await?
        .ok_or_else(|| ApiError::FieldNotFound(field_id.to_string()))?;

    let snapshot = db::load_snapshot(&state.db, &contract_id).await?;
    if let Some(signer_id) = &patch.signer_id {
        check_signer(&snapshot.contract, signer_id.as_ref())?;
    }

    let mut store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
    let field = store.update(&field_id, patch)?.clone();

    db::update_field(&state.db, &field).await?;
    debug!(field = %field.id, "field updated");

    Ok(Json(FieldRecord::from_field(&field)))
}

/// Removing a field that no longer exists succeeds
pub async fn delete_field(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteFieldQuery>,
) -> Result<Json<DeleteFieldResponse>, ApiError> {
    let Some(contract_id) = db::contract_of_field(&state.db, &query.field_id).await? else {
        return Ok(Json(DeleteFieldResponse { deleted: false }));
    };

    let snapshot = db::load_snapshot(&state.db, &contract_id).await?;
    let mut store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
    store.remove(&query.field_id)?;

    db::delete_field(&state.db, &query.field_id).await?;
    debug!(field = %query.field_id, "field deleted");

    Ok(Json(DeleteFieldResponse { deleted: true }))
}

/// Move a draft contract to `sent`
pub async fn send_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SendResponse>, ApiError> {
    let contract_id = ContractId::new(id);
    let snapshot = db::load_snapshot(&state.db, &contract_id).await?;
    let contract = snapshot.contract;
    if !contract.status.is_editable() {
        return Err(ApiError::ContractLocked(contract.status));
    }

    if state.enforce_readiness {
        let store = FieldStore::with_fields(&contract, snapshot.fields);
        if let readiness @ Readiness::NotReady(_) = check_readiness(&contract.signers, &store) {
            let message = readiness.warning_message().unwrap_or_default();
            info!("Refused to send contract {}: {}", contract_id, message);
            return Err(ApiError::NotReady(message));
        }
    }

    db::set_status(&state.db, &contract_id, ContractStatus::Sent).await?;
    info!("Contract sent for signature: {}", contract_id);

    Ok(Json(SendResponse {
        status: ContractStatus::Sent,
    }))
}

/// A field may only be assigned to a signer of its own contract
fn check_signer(contract: &Contract, signer_id: Option<&SignerId>) -> Result<(), ApiError> {
    match signer_id {
        Some(id) if contract.signer(id).is_none() => Err(ApiError::InvalidRequest(format!(
            "Unknown signer: {}",
            id
        ))),
        _ => Ok(()),
    }
}

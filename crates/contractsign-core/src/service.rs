//! Contract field service
//!
//! Orchestrates the field store, the drag session and the persistence backend
//! for one contract being edited. Every mutation is applied to the local store
//! first (optimistic) and then persisted; when the backend fails, the
//! [`ReconcilePolicy`] decides between restoring the local snapshot and
//! reloading the whole contract from the server.
//!
//! There is no version check: when two editors touch the same contract the
//! last write to reach the server wins.

use tracing::{debug, info, warn};

use crate::assignment::SignerAssignmentIndex;
use crate::backend::{ContractSnapshot, FieldBackend};
use crate::drag::{DragMode, DragSession};
use crate::error::{BackendError, FieldError, Result};
use crate::geometry::{Point, Rect, Viewport};
use crate::model::{
    Contract, ContractId, ContractStatus, DocumentId, Field, FieldId, FieldType, Position, Signer,
    SignerId, Size,
};
use crate::pages::PageSpec;
use crate::readiness::{check_readiness, Readiness};
use crate::reconcile::{DefaultReconcilePolicy, FailedOperation, ReconcilePolicy, Recovery};
use crate::store::{FieldPatch, FieldStore, NewField};

/// Placement tool state: who the next placed field belongs to, and its type.
/// Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementTool {
    pub signer_id: Option<SignerId>,
    pub field_type: FieldType,
}

/// Result of asking to send the contract for signature
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The server accepted the transition
    Sent(ContractStatus),
    /// Nothing was sent; these signers still lack a signature field
    NotReady(Vec<Signer>),
}

/// Local state to put back if a persistence call fails
enum Undo {
    /// Drop the optimistic field
    Discard(FieldId),
    /// Put the field back as it was
    Restore(Field),
    Nothing,
}

pub struct ContractFieldService<B, P = DefaultReconcilePolicy> {
    backend: B,
    policy: P,
    contract: Contract,
    store: FieldStore,
    drag: DragSession,
    tool: PlacementTool,
}

impl<B: FieldBackend> ContractFieldService<B> {
    /// Load a contract and its fields with the default reconcile policy
    pub async fn load(backend: B, contract_id: &ContractId) -> Result<Self> {
        Self::load_with_policy(backend, DefaultReconcilePolicy, contract_id).await
    }
}

impl<B: FieldBackend, P: ReconcilePolicy> ContractFieldService<B, P> {
    pub async fn load_with_policy(backend: B, policy: P, contract_id: &ContractId) -> Result<Self> {
        let snapshot = backend.fetch_contract(contract_id).await?;
        info!(
            contract = %contract_id,
            fields = snapshot.fields.len(),
            "loaded contract for field placement"
        );
        Ok(Self::from_snapshot(backend, policy, snapshot))
    }

    pub fn from_snapshot(backend: B, policy: P, snapshot: ContractSnapshot) -> Self {
        let store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
        let tool = PlacementTool {
            signer_id: default_signer(&snapshot.contract, &store),
            field_type: FieldType::Signature,
        };
        Self {
            backend,
            policy,
            contract: snapshot.contract,
            store,
            drag: DragSession::new(),
            tool,
        }
    }

    // ============================================================
    // Read side
    // ============================================================

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tool(&self) -> &PlacementTool {
        &self.tool
    }

    pub fn assignments(&self) -> SignerAssignmentIndex<'_> {
        SignerAssignmentIndex::new(&self.store)
    }

    pub fn readiness(&self) -> Readiness {
        check_readiness(&self.contract.signers, &self.store)
    }

    // ============================================================
    // Placement tool
    // ============================================================

    pub fn set_active_signer(&mut self, signer_id: Option<SignerId>) {
        self.tool.signer_id = signer_id;
    }

    pub fn set_active_field_type(&mut self, field_type: FieldType) {
        self.tool.field_type = field_type;
    }

    // ============================================================
    // Field mutations
    // ============================================================

    /// Create a field from page-space geometry
    pub async fn create_field(&mut self, new: NewField) -> Result<FieldId> {
        let temporary = self.store.create(new)?;
        let field = self
            .store
            .get(&temporary)
            .cloned()
            .ok_or_else(|| FieldError::UnknownField(temporary.clone()))?;
        debug!(field = %temporary, document = %field.document_id, "optimistic create");

        match self.backend.create_field(&field).await {
            Ok(saved) => {
                self.store.reconcile_id(&temporary, saved.id.clone())?;
                debug!(temporary = %temporary, field = %saved.id, "create confirmed");
                Ok(saved.id)
            }
            Err(err) => {
                self.recover(FailedOperation::Create, Undo::Discard(temporary), err)
                    .await
            }
        }
    }

    /// Place a field of the active type for the active signer with its
    /// top-left corner at `pointer` (presentation space) on `page`
    pub async fn place_field(
        &mut self,
        document_id: &DocumentId,
        page: u32,
        pointer: Point,
        viewport: Viewport,
    ) -> Result<FieldId> {
        let field_type = self.tool.field_type;
        let default = field_type.default_size();
        let rect = viewport.to_page_space(Rect::new(
            pointer.x,
            pointer.y,
            default.width * viewport.zoom,
            default.height * viewport.zoom,
        ));

        self.create_field(NewField {
            document_id: document_id.clone(),
            signer_id: self.tool.signer_id.clone(),
            field_type,
            pages: PageSpec::single(page),
            position: Position::new(rect.x, rect.y),
            size: Size::new(rect.width, rect.height),
            content: None,
        })
        .await
    }

    /// Apply a partial update (retype, reassign, pages, content, geometry)
    pub async fn update_field(&mut self, field_id: &FieldId, patch: FieldPatch) -> Result<()> {
        let previous = self
            .store
            .get(field_id)
            .cloned()
            .ok_or_else(|| FieldError::UnknownField(field_id.clone()))?;
        self.store.update(field_id, patch.clone())?;
        debug!(field = %field_id, "optimistic update");
        self.persist_update(field_id, &patch, previous).await
    }

    /// Set a field's page-space position
    pub async fn move_field(&mut self, field_id: &FieldId, position: Position) -> Result<()> {
        self.update_field(field_id, FieldPatch::default().with_position(position))
            .await
    }

    /// Set a field's page-space size
    pub async fn resize_field(&mut self, field_id: &FieldId, size: Size) -> Result<()> {
        self.update_field(field_id, FieldPatch::default().with_size(size))
            .await
    }

    /// Remove a field. Deleting an id that is already gone succeeds.
    pub async fn delete_field(&mut self, field_id: &FieldId) -> Result<()> {
        if self.drag.active().map(|d| &d.field_id) == Some(field_id) {
            self.drag.cancel();
        }

        let pending = self.store.is_pending(field_id);
        let removed = self.store.remove(field_id)?;
        debug!(field = %field_id, present = removed.is_some(), "optimistic delete");
        if pending {
            // Never reached the server
            return Ok(());
        }

        match self.backend.delete_field(field_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let undo = removed.map(Undo::Restore).unwrap_or(Undo::Nothing);
                self.recover(FailedOperation::Delete, undo, err).await
            }
        }
    }

    // ============================================================
    // Drag gestures
    // ============================================================

    pub fn begin_drag(
        &mut self,
        field_id: &FieldId,
        mode: DragMode,
        pointer: Point,
        viewport: Viewport,
    ) -> Result<Rect> {
        self.drag
            .begin(&self.store, field_id, mode, pointer, viewport)
    }

    /// Update the live preview. Never persists.
    pub fn drag_to(&mut self, pointer: Point) -> Result<Rect> {
        self.drag.update(pointer)
    }

    pub fn cancel_drag(&mut self) -> Option<FieldId> {
        self.drag.cancel()
    }

    /// Commit the active drag: one store update and at most one persistence
    /// call per gesture
    pub async fn commit_drag(&mut self) -> Result<()> {
        let Some(committed) = self.drag.commit(&mut self.store)? else {
            return Ok(());
        };
        self.persist_update(&committed.field_id, &committed.patch, committed.previous)
            .await
    }

    // ============================================================
    // Sending
    // ============================================================

    /// Send the contract for signature once every required signer owns a
    /// signature field. A not-ready contract never reaches the backend.
    pub async fn send_for_signature(&mut self) -> Result<SendOutcome> {
        if !self.contract.status.is_editable() {
            return Err(FieldError::ContractNotEditable(self.contract.status));
        }
        if let Some(drag) = self.drag.active() {
            return Err(FieldError::SessionBusy(drag.field_id.clone()));
        }

        if let Readiness::NotReady(missing) = self.readiness() {
            info!(
                contract = %self.contract.id,
                missing = missing.len(),
                "send blocked: signers without signature field"
            );
            return Ok(SendOutcome::NotReady(missing));
        }

        let status = self
            .backend
            .send_contract(&self.contract.id)
            .await
            .inspect_err(|err| warn!(contract = %self.contract.id, "send failed: {}", err))?;
        self.contract.status = status;
        self.store.set_status(status);
        info!(contract = %self.contract.id, %status, "contract sent for signature");
        Ok(SendOutcome::Sent(status))
    }

    // ============================================================
    // Resynchronization
    // ============================================================

    /// Replace local state with the server's view of the contract
    pub async fn refetch(&mut self) -> Result<()> {
        let snapshot = self.backend.fetch_contract(&self.contract.id).await?;
        self.drag.cancel();
        self.store = FieldStore::with_fields(&snapshot.contract, snapshot.fields);
        self.contract = snapshot.contract;

        let signer_gone = self
            .tool
            .signer_id
            .as_ref()
            .is_some_and(|id| self.contract.signer(id).is_none());
        if signer_gone {
            self.tool.signer_id = default_signer(&self.contract, &self.store);
        }
        debug!(contract = %self.contract.id, fields = self.store.len(), "refetched");
        Ok(())
    }

    async fn persist_update(
        &mut self,
        field_id: &FieldId,
        patch: &FieldPatch,
        previous: Field,
    ) -> Result<()> {
        if self.store.is_pending(field_id) {
            // Nothing to update server-side yet
            return Ok(());
        }
        match self.backend.update_field(field_id, patch).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.recover(FailedOperation::Update, Undo::Restore(previous), err)
                    .await
            }
        }
    }

    /// Undo or resynchronize after a failed persistence call, then report the
    /// failure
    async fn recover<T>(
        &mut self,
        operation: FailedOperation,
        undo: Undo,
        err: BackendError,
    ) -> Result<T> {
        let recovery = self.policy.recovery_for(operation);
        warn!(?operation, ?recovery, "persistence failed: {}", err);

        match recovery {
            Recovery::Rollback => {
                let rolled_back = match undo {
                    Undo::Discard(id) => self.store.remove(&id).map(|_| ()),
                    Undo::Restore(field) => self.store.restore(field),
                    Undo::Nothing => Ok(()),
                };
                if let Err(rollback_err) = rolled_back {
                    warn!("rollback failed: {}", rollback_err);
                }
            }
            Recovery::Refetch => {
                if let Err(refetch_err) = self.refetch().await {
                    warn!("resynchronizing refetch failed: {}", refetch_err);
                }
            }
        }

        Err(FieldError::Persistence(err))
    }
}

/// First required signer without a signature field, else the first signer
fn default_signer(contract: &Contract, store: &FieldStore) -> Option<SignerId> {
    SignerAssignmentIndex::new(store)
        .next_signer_needing_signature(&contract.signers)
        .or_else(|| contract.signers.first())
        .map(|s| s.id.clone())
}

//! In-memory field store for one contract
//!
//! The store is the authoritative local collection of fields across all
//! documents of a loaded contract. It enforces the field invariants (known
//! document, positive size, pages within the document, draft-only mutation)
//! but never talks to the network; persistence belongs to the service layer.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{FieldError, Result};
use crate::model::{
    Contract, ContractStatus, DocumentId, Field, FieldId, FieldType, Position, SignerId, Size,
};
use crate::pages::PageSpec;

/// Everything needed to place a new field. Geometry is in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub document_id: DocumentId,
    pub signer_id: Option<SignerId>,
    pub field_type: FieldType,
    pub pages: PageSpec,
    pub position: Position,
    pub size: Size,
    pub content: Option<String>,
}

/// Partial update. `None` leaves an attribute untouched; for the nullable
/// attributes `Some(None)` clears them.
///
/// There is deliberately no way to change the owning document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub signer_id: Option<Option<SignerId>>,
    pub field_type: Option<FieldType>,
    pub pages: Option<PageSpec>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub content: Option<Option<String>>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self == &FieldPatch::default()
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_signer(mut self, signer_id: Option<SignerId>) -> Self {
        self.signer_id = Some(signer_id);
        self
    }

    pub fn with_field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_pages(mut self, pages: PageSpec) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = Some(content);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FieldStore {
    status: ContractStatus,
    /// Page count per document of the contract
    documents: BTreeMap<DocumentId, u32>,
    /// Insertion ordered; contracts hold few enough fields for linear lookups
    fields: Vec<Field>,
    /// Ids assigned by `create` and not yet reconciled with a server id
    pending: BTreeSet<FieldId>,
}

impl FieldStore {
    /// Empty store scoped to the documents and status of `contract`
    pub fn new(contract: &Contract) -> Self {
        Self {
            status: contract.status,
            documents: contract
                .documents
                .iter()
                .map(|d| (d.id.clone(), d.page_count))
                .collect(),
            fields: Vec::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Store pre-populated with fields already persisted on the server
    pub fn with_fields(contract: &Contract, fields: Vec<Field>) -> Self {
        let mut store = Self::new(contract);
        store.fields = fields;
        store
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ContractStatus) {
        self.status = status;
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(FieldError::ContractNotEditable(self.status))
        }
    }

    fn page_count(&self, document_id: &DocumentId) -> Result<u32> {
        self.documents
            .get(document_id)
            .copied()
            .ok_or_else(|| FieldError::UnknownDocument(document_id.clone()))
    }

    fn index_of(&self, id: &FieldId) -> Option<usize> {
        self.fields.iter().position(|f| &f.id == id)
    }

    /// Place a new field under a fresh temporary id
    pub fn create(&mut self, new: NewField) -> Result<FieldId> {
        self.ensure_editable()?;
        let page_count = self.page_count(&new.document_id)?;
        check_size(&new.size)?;
        new.pages.check_within(page_count)?;

        let field = Field {
            id: FieldId::temporary(),
            document_id: new.document_id,
            signer_id: new.signer_id,
            field_type: new.field_type,
            pages: new.pages,
            position: clamp_position(new.position),
            size: new.size,
            content: new.content,
        };
        let id = field.id.clone();
        self.fields.push(field);
        self.pending.insert(id.clone());
        Ok(id)
    }

    /// Merge the attributes present in `patch`. Validation happens before any
    /// attribute is written, so a rejected patch leaves the field untouched.
    pub fn update(&mut self, id: &FieldId, patch: FieldPatch) -> Result<&Field> {
        self.ensure_editable()?;
        let index = self
            .index_of(id)
            .ok_or_else(|| FieldError::UnknownField(id.clone()))?;

        if let Some(size) = &patch.size {
            check_size(size)?;
        }
        if let Some(pages) = &patch.pages {
            let page_count = self.page_count(&self.fields[index].document_id)?;
            pages.check_within(page_count)?;
        }

        let field = &mut self.fields[index];
        if let Some(signer_id) = patch.signer_id {
            field.signer_id = signer_id;
        }
        if let Some(field_type) = patch.field_type {
            field.field_type = field_type;
        }
        if let Some(pages) = patch.pages {
            field.pages = pages;
        }
        if let Some(position) = patch.position {
            field.position = clamp_position(position);
        }
        if let Some(size) = patch.size {
            field.size = size;
        }
        if let Some(content) = patch.content {
            field.content = content;
        }
        Ok(field)
    }

    /// Remove a field. Removing an absent id is a no-op and returns `None`.
    pub fn remove(&mut self, id: &FieldId) -> Result<Option<Field>> {
        self.ensure_editable()?;
        self.pending.remove(id);
        Ok(self.index_of(id).map(|index| self.fields.remove(index)))
    }

    /// Put back a previously removed or modified field, keeping its id
    pub fn restore(&mut self, field: Field) -> Result<()> {
        self.ensure_editable()?;
        self.page_count(&field.document_id)?;
        match self.index_of(&field.id) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        Ok(())
    }

    /// Swap a temporary id for the server-assigned one
    pub fn reconcile_id(&mut self, temporary: &FieldId, server_id: FieldId) -> Result<()> {
        let index = self
            .index_of(temporary)
            .ok_or_else(|| FieldError::UnknownField(temporary.clone()))?;
        self.fields[index].id = server_id;
        self.pending.remove(temporary);
        Ok(())
    }

    /// Replace every field with server truth
    pub fn replace_all(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        self.pending.clear();
    }

    /// True while `id` was created locally and has no server id yet
    pub fn is_pending(&self, id: &FieldId) -> bool {
        self.pending.contains(id)
    }

    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields_for_document(&self, document_id: &DocumentId) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| &f.document_id == document_id)
            .collect()
    }

    /// Fields of one document that appear on `page`
    pub fn fields_on_page(&self, document_id: &DocumentId, page: u32) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| &f.document_id == document_id && f.pages.contains(page))
            .collect()
    }

    pub fn fields_for_signer(&self, signer_id: &SignerId) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.signer_id.as_ref() == Some(signer_id))
            .collect()
    }

    pub fn signature_fields_for_signer(&self, signer_id: &SignerId) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.is_signature_for(signer_id))
            .collect()
    }
}

fn check_size(size: &Size) -> Result<()> {
    if size.is_valid() {
        Ok(())
    } else {
        Err(FieldError::InvalidGeometry {
            width: size.width,
            height: size.height,
        })
    }
}

fn clamp_position(position: Position) -> Position {
    Position::new(position.x.max(0.0), position.y.max(0.0))
}



#[cfg(test)]
mod proptests {
    use super::test_support::*;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: removing twice leaves the same state as removing once
        #[test]
        fn remove_twice_equals_remove_once(count in 1usize..8, victim in 0usize..8) {
            let mut store = FieldStore::new(&contract());
            let ids: Vec<FieldId> = (0..count)
                .map(|_| store.create(new_field("d1", None, FieldType::Text)).unwrap())
                .collect();
            let id = ids[victim % count].clone();

            store.remove(&id).unwrap();
            let once = store.fields().to_vec();
            store.remove(&id).unwrap();
            prop_assert_eq!(store.fields(), once.as_slice());
        }

        /// Property: degenerate rectangles never enter the store
        #[test]
        fn degenerate_sizes_rejected(width in -100.0f64..=0.0, height in 1.0f64..100.0, swap in any::<bool>()) {
            let mut store = FieldStore::new(&contract());
            let id = store.create(new_field("d1", None, FieldType::Text)).unwrap();
            let before = store.fields().to_vec();

            let size = if swap { Size::new(height, width) } else { Size::new(width, height) };
            let mut new = new_field("d1", None, FieldType::Text);
            new.size = size;

            let created = store.create(new);
            prop_assert!(
                matches!(created, Err(FieldError::InvalidGeometry { .. })),
                "create accepted {:?}",
                size
            );
            let updated = store.update(&id, FieldPatch::default().with_size(size));
            prop_assert!(
                matches!(updated, Err(FieldError::InvalidGeometry { .. })),
                "update accepted {:?}",
                size
            );
            prop_assert_eq!(store.fields(), before.as_slice());
        }

        /// Property: unknown documents never enter the store
        #[test]
        fn unknown_document_rejected(doc in "[a-z]{3,8}") {
            let mut store = FieldStore::new(&contract());
            let result = store.create(new_field(&doc, None, FieldType::Signature));
            prop_assert!(
                matches!(result, Err(FieldError::UnknownDocument(_))),
                "document {:?} accepted",
                doc
            );
            prop_assert!(store.is_empty());
        }
    }
}

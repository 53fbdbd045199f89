//! Signer → field assignments, derived from the field store on every query

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{FieldId, Signer, SignerId};
use crate::store::FieldStore;

/// Read-only view over a [`FieldStore`]. Nothing is cached, so the view can
/// never go stale; contracts rarely hold more than a hundred fields.
#[derive(Debug, Clone, Copy)]
pub struct SignerAssignmentIndex<'a> {
    store: &'a FieldStore,
}

impl<'a> SignerAssignmentIndex<'a> {
    pub fn new(store: &'a FieldStore) -> Self {
        Self { store }
    }

    /// Field ids grouped by assigned signer. Unassigned fields are left out.
    pub fn assignments(&self) -> BTreeMap<SignerId, BTreeSet<FieldId>> {
        let mut map: BTreeMap<SignerId, BTreeSet<FieldId>> = BTreeMap::new();
        for field in self.store.fields() {
            if let Some(signer_id) = &field.signer_id {
                map.entry(signer_id.clone())
                    .or_default()
                    .insert(field.id.clone());
            }
        }
        map
    }

    pub fn fields_for(&self, signer_id: &SignerId) -> BTreeSet<FieldId> {
        self.store
            .fields_for_signer(signer_id)
            .into_iter()
            .map(|f| f.id.clone())
            .collect()
    }

    /// True iff the signer owns a signature field on any document
    pub fn has_signature_field(&self, signer_id: &SignerId) -> bool {
        self.store
            .fields()
            .iter()
            .any(|f| f.is_signature_for(signer_id))
    }

    /// Fields nobody has been assigned to yet
    pub fn unassigned(&self) -> Vec<FieldId> {
        self.store
            .fields()
            .iter()
            .filter(|f| f.signer_id.is_none())
            .map(|f| f.id.clone())
            .collect()
    }

    /// First required signer still missing a signature field, in signer order.
    /// Used to preselect who the next placed field belongs to.
    pub fn next_signer_needing_signature<'s>(&self, signers: &'s [Signer]) -> Option<&'s Signer> {
        signers
            .iter()
            .find(|s| s.is_required() && !self.has_signature_field(&s.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, SignerRole};
    use crate::store::test_support::*;

    #[test]
    fn test_assignments_group_by_signer() {
        let mut store = FieldStore::new(&contract());
        let a = store
            .create(new_field("d1", Some("s1"), FieldType::Signature))
            .unwrap();
        let b = store
            .create(new_field("d2", Some("s1"), FieldType::Date))
            .unwrap();
        let c = store
            .create(new_field("d1", Some("s2"), FieldType::Initials))
            .unwrap();
        let d = store.create(new_field("d1", None, FieldType::Text)).unwrap();

        let index = SignerAssignmentIndex::new(&store);
        let map = index.assignments();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&SignerId::from("s1")], BTreeSet::from([a.clone(), b]));
        assert_eq!(map[&SignerId::from("s2")], BTreeSet::from([c]));
        assert_eq!(index.unassigned(), vec![d]);
        assert!(index.fields_for(&SignerId::from("s1")).contains(&a));
    }

    #[test]
    fn test_has_signature_field_across_documents() {
        let mut store = FieldStore::new(&contract());
        store
            .create(new_field("d2", Some("s2"), FieldType::Signature))
            .unwrap();
        store
            .create(new_field("d1", Some("s1"), FieldType::Initials))
            .unwrap();

        let index = SignerAssignmentIndex::new(&store);
        assert!(index.has_signature_field(&SignerId::from("s2")));
        // Initials do not count as a signature
        assert!(!index.has_signature_field(&SignerId::from("s1")));
    }

    #[test]
    fn test_removing_only_signature_flips_flag() {
        let mut store = FieldStore::new(&contract());
        let id = store
            .create(new_field("d1", Some("s1"), FieldType::Signature))
            .unwrap();
        let s1 = SignerId::from("s1");
        assert!(SignerAssignmentIndex::new(&store).has_signature_field(&s1));

        store.remove(&id).unwrap();
        assert!(!SignerAssignmentIndex::new(&store).has_signature_field(&s1));
    }

    #[test]
    fn test_next_signer_skips_non_required_roles() {
        let mut store = FieldStore::new(&contract());
        let signers = vec![
            signer("v1", SignerRole::Validator),
            signer("s1", SignerRole::Signer),
            signer("s2", SignerRole::Signer),
        ];
        let index = SignerAssignmentIndex::new(&store);
        assert_eq!(
            index.next_signer_needing_signature(&signers).unwrap().id,
            SignerId::from("s1")
        );

        store
            .create(new_field("d1", Some("s1"), FieldType::Signature))
            .unwrap();
        let index = SignerAssignmentIndex::new(&store);
        assert_eq!(
            index.next_signer_needing_signature(&signers).unwrap().id,
            SignerId::from("s2")
        );
    }
}

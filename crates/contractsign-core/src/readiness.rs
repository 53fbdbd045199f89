//! Send readiness: every required signer owns at least one signature field

use crate::assignment::SignerAssignmentIndex;
use crate::model::Signer;
use crate::store::FieldStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready,
    /// Required signers without a signature field, in signer order
    NotReady(Vec<Signer>),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn missing_signers(&self) -> &[Signer] {
        match self {
            Readiness::Ready => &[],
            Readiness::NotReady(missing) => missing,
        }
    }

    /// Banner text naming the signers still missing a signature field
    pub fn warning_message(&self) -> Option<String> {
        match self {
            Readiness::Ready => None,
            Readiness::NotReady(missing) => {
                let names: Vec<&str> = missing.iter().map(|s| s.name.as_str()).collect();
                Some(format!(
                    "Each signer needs at least one signature field. Missing: {}",
                    names.join(", ")
                ))
            }
        }
    }
}

/// Decide whether the contract may be sent. Validators and viewers never block.
pub fn check_readiness(signers: &[Signer], store: &FieldStore) -> Readiness {
    let index = SignerAssignmentIndex::new(store);
    let missing: Vec<Signer> = signers
        .iter()
        .filter(|s| s.is_required() && !index.has_signature_field(&s.id))
        .cloned()
        .collect();

    if missing.is_empty() {
        Readiness::Ready
    } else {
        Readiness::NotReady(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, SignerRole};
    use crate::store::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_fields_all_missing() {
        let contract = contract();
        let store = FieldStore::new(&contract);
        assert_eq!(
            check_readiness(&contract.signers, &store),
            Readiness::NotReady(contract.signers.clone())
        );
    }

    #[test]
    fn test_progressive_readiness() {
        let contract = contract();
        let mut store = FieldStore::new(&contract);

        store
            .create(new_field("d1", Some("s1"), FieldType::Signature))
            .unwrap();
        assert_eq!(
            check_readiness(&contract.signers, &store),
            Readiness::NotReady(vec![contract.signers[1].clone()])
        );

        store
            .create(new_field("d2", Some("s2"), FieldType::Signature))
            .unwrap();
        assert_eq!(check_readiness(&contract.signers, &store), Readiness::Ready);
    }

    #[test]
    fn test_non_signature_fields_do_not_count() {
        let contract = contract();
        let mut store = FieldStore::new(&contract);
        for t in [FieldType::Initials, FieldType::Name, FieldType::Date] {
            store.create(new_field("d1", Some("s1"), t)).unwrap();
        }
        let readiness = check_readiness(&contract.signers, &store);
        assert_eq!(readiness.missing_signers().len(), 2);
    }

    #[test]
    fn test_validators_and_viewers_ignored() {
        let contract = contract();
        let store = FieldStore::new(&contract);
        let signers = vec![
            signer("v1", SignerRole::Validator),
            signer("w1", SignerRole::Viewer),
        ];
        assert_eq!(check_readiness(&signers, &store), Readiness::Ready);
        assert_eq!(check_readiness(&[], &store), Readiness::Ready);
    }

    #[test]
    fn test_warning_message_names_signers() {
        let contract = contract();
        let store = FieldStore::new(&contract);
        let message = check_readiness(&contract.signers, &store)
            .warning_message()
            .unwrap();
        assert!(message.contains("Signer s1"));
        assert!(message.contains("Signer s2"));
        assert_eq!(Readiness::Ready.warning_message(), None);
    }
}

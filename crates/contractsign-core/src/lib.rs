//! Field placement engine for contract e-signature
//!
//! Places signature, initials, name, date, text and input fields on the pages
//! of a contract's documents, keeps them consistent with a persistence
//! backend, and decides when a contract may be sent for signature.
//!
//! - [`geometry`]: page space (points, bottom-left origin) to presentation
//!   space (pixels, top-left origin) and back
//! - [`store`]: the validated in-memory field collection
//! - [`drag`]: move/resize gestures that persist once, on release
//! - [`readiness`]: every required signer owns a signature field
//! - [`service`]: optimistic mutations against a [`FieldBackend`]
//! - [`http`]: reqwest implementation of [`FieldBackend`] (feature `http`)

pub mod assignment;
pub mod backend;
pub mod drag;
pub mod error;
pub mod geometry;
#[cfg(feature = "http")]
pub mod http;
pub mod model;
pub mod pages;
pub mod readiness;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod wire;

pub use assignment::SignerAssignmentIndex;
pub use backend::{ContractSnapshot, FieldBackend};
pub use drag::{DragMode, DragSession};
pub use error::{BackendError, FieldError, Result};
pub use geometry::{Point, Rect, Viewport};
#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpBackendConfig};
pub use model::{
    Contract, ContractId, ContractStatus, Document, DocumentId, Field, FieldId, FieldType,
    Position, Signer, SignerId, SignerRole, Size,
};
pub use pages::PageSpec;
pub use readiness::{check_readiness, Readiness};
pub use reconcile::{DefaultReconcilePolicy, ReconcilePolicy, RollbackPolicy};
pub use service::{ContractFieldService, PlacementTool, SendOutcome};
pub use store::{FieldPatch, FieldStore, NewField};

//! Data model: contracts, their documents and signers, and placed fields

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Rect;
use crate::pages::PageSpec;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(ContractId);
string_id!(DocumentId);
string_id!(SignerId);
string_id!(
    /// Field identifier. Fields placed locally carry a temporary id until the
    /// server assigns the real one.
    FieldId
);

const TEMPORARY_PREFIX: &str = "tmp-";

impl FieldId {
    /// Generate a client-side temporary id. Whether an id is still awaiting
    /// its server id is tracked by the store, not by this prefix.
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMPORARY_PREFIX, Uuid::new_v4()))
    }
}

/// Contract lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    Sent,
    Signed,
    Declined,
    Expired,
}

impl ContractStatus {
    /// Fields may only be created, updated or deleted while in draft
    pub fn is_editable(&self) -> bool {
        matches!(self, ContractStatus::Draft)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Sent => "sent",
            ContractStatus::Signed => "signed",
            ContractStatus::Declined => "declined",
            ContractStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ContractStatus::Draft),
            "sent" => Some(ContractStatus::Sent),
            "signed" => Some(ContractStatus::Signed),
            "declined" => Some(ContractStatus::Declined),
            "expired" => Some(ContractStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signer role. Only `Signer` counts toward send readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    Signer,
    Validator,
    Viewer,
}

impl SignerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerRole::Signer => "signer",
            SignerRole::Validator => "validator",
            SignerRole::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "signer" => Some(SignerRole::Signer),
            "validator" => Some(SignerRole::Validator),
            "viewer" => Some(SignerRole::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Signature,
    Initials,
    Name,
    Date,
    Text,
    Input,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Signature,
        FieldType::Initials,
        FieldType::Name,
        FieldType::Date,
        FieldType::Text,
        FieldType::Input,
    ];

    /// Size of a freshly placed field, in points. Every type starts at 200x50.
    pub fn default_size(&self) -> Size {
        Size::new(200.0, 50.0)
    }

    pub fn is_signature(&self) -> bool {
        matches!(self, FieldType::Signature)
    }

    /// Only text fields carry fixed literal content
    pub fn uses_content(&self) -> bool {
        matches!(self, FieldType::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Signature => "signature",
            FieldType::Initials => "initials",
            FieldType::Name => "name",
            FieldType::Date => "date",
            FieldType::Text => "text",
            FieldType::Input => "input",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bottom-left corner of a field in page space (points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Field dimensions in page space (points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Degenerate sizes are never stored
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub original_path: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signer {
    pub id: SignerId,
    pub name: String,
    pub email: String,
    pub role: SignerRole,
}

impl Signer {
    /// Whether this signer must own a signature field before sending
    pub fn is_required(&self) -> bool {
        self.role == SignerRole::Signer
    }
}

/// A contract as seen by the field placement engine. Fields live in the
/// [`FieldStore`](crate::store::FieldStore), not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub title: String,
    pub status: ContractStatus,
    pub documents: Vec<Document>,
    pub signers: Vec<Signer>,
}

impl Contract {
    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn signer(&self, id: &SignerId) -> Option<&Signer> {
        self.signers.iter().find(|s| &s.id == id)
    }
}

/// A field placed on one or more pages of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub document_id: DocumentId,
    /// Weak reference; clearing or removing the signer keeps the field
    pub signer_id: Option<SignerId>,
    pub field_type: FieldType,
    pub pages: PageSpec,
    pub position: Position,
    pub size: Size,
    pub content: Option<String>,
}

impl Field {
    /// Page-space rectangle of this field
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }

    pub fn is_signature_for(&self, signer: &SignerId) -> bool {
        self.field_type.is_signature() && self.signer_id.as_ref() == Some(signer)
    }
}

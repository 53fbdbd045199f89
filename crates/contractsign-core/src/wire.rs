//! JSON wire format for the field persistence endpoints
//!
//! Field position and size travel as independently JSON-encoded strings
//! (`"{\"x\":50,\"y\":700}"`) rather than nested objects. They are decoded
//! here, once, and never leave this module in string form.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::ContractSnapshot;
use crate::error::BackendError;
use crate::model::{
    Contract, ContractId, ContractStatus, Document, DocumentId, Field, FieldId, FieldType,
    Position, Signer, SignerId, SignerRole, Size,
};
use crate::pages::PageSpec;
use crate::store::{FieldPatch, NewField};

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Malformed {attribute}: {reason}")]
    Malformed {
        attribute: &'static str,
        reason: String,
    },
}

impl From<WireError> for BackendError {
    fn from(err: WireError) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Field as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub id: FieldId,
    pub document_id: DocumentId,
    pub signer_id: Option<SignerId>,
    pub field_type: FieldType,
    pub pages: String,
    pub position: String,
    pub size: String,
    pub content: Option<String>,
}

impl FieldRecord {
    pub fn from_field(field: &Field) -> Self {
        Self {
            id: field.id.clone(),
            document_id: field.document_id.clone(),
            signer_id: field.signer_id.clone(),
            field_type: field.field_type,
            pages: field.pages.to_string(),
            position: encode_position(&field.position),
            size: encode_size(&field.size),
            content: field.content.clone(),
        }
    }

    pub fn into_field(self) -> Result<Field, WireError> {
        Ok(Field {
            id: self.id,
            document_id: self.document_id,
            signer_id: self.signer_id,
            field_type: self.field_type,
            pages: decode_pages(&self.pages)?,
            position: decode_position(&self.position)?,
            size: decode_size(&self.size)?,
            content: self.content,
        })
    }
}

/// Body of `POST fields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    pub document_id: DocumentId,
    pub signer_id: Option<SignerId>,
    pub field_type: FieldType,
    pub pages: String,
    pub position: String,
    pub size: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateFieldRequest {
    pub fn from_field(field: &Field) -> Self {
        Self {
            document_id: field.document_id.clone(),
            signer_id: field.signer_id.clone(),
            field_type: field.field_type,
            pages: field.pages.to_string(),
            position: encode_position(&field.position),
            size: encode_size(&field.size),
            content: field.content.clone(),
        }
    }

    pub fn into_new_field(self) -> Result<NewField, WireError> {
        Ok(NewField {
            document_id: self.document_id,
            signer_id: self.signer_id,
            field_type: self.field_type,
            pages: decode_pages(&self.pages)?,
            position: decode_position(&self.position)?,
            size: decode_size(&self.size)?,
            content: self.content,
        })
    }
}

/// Body of `PUT fields`: `fieldId` plus any subset of the field attributes.
/// An explicit `null` for `signerId` or `content` clears it; an absent key
/// leaves it alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    pub field_id: FieldId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub signer_id: Option<Option<SignerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub content: Option<Option<String>>,
}

impl UpdateFieldRequest {
    pub fn from_patch(field_id: &FieldId, patch: &FieldPatch) -> Self {
        Self {
            field_id: field_id.clone(),
            signer_id: patch.signer_id.clone(),
            field_type: patch.field_type,
            pages: patch.pages.as_ref().map(|p| p.to_string()),
            position: patch.position.as_ref().map(encode_position),
            size: patch.size.as_ref().map(encode_size),
            content: patch.content.clone(),
        }
    }

    pub fn into_patch(self) -> Result<(FieldId, FieldPatch), WireError> {
        let patch = FieldPatch {
            signer_id: self.signer_id,
            field_type: self.field_type,
            pages: self.pages.as_deref().map(decode_pages).transpose()?,
            position: self.position.as_deref().map(decode_position).transpose()?,
            size: self.size.as_deref().map(decode_size).transpose()?,
            content: self.content,
        };
        Ok((self.field_id, patch))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub filename: String,
    pub original_path: String,
    pub page_count: u32,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerRecord {
    pub id: SignerId,
    pub name: String,
    pub email: String,
    pub signer_type: SignerRole,
}

impl From<&Signer> for SignerRecord {
    fn from(signer: &Signer) -> Self {
        Self {
            id: signer.id.clone(),
            name: signer.name.clone(),
            email: signer.email.clone(),
            signer_type: signer.role,
        }
    }
}

impl From<SignerRecord> for Signer {
    fn from(record: SignerRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.signer_type,
        }
    }
}

/// Contract with its documents (each carrying its fields) and signers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: ContractId,
    pub title: String,
    pub status: ContractStatus,
    pub documents: Vec<DocumentRecord>,
    pub signers: Vec<SignerRecord>,
}

impl ContractRecord {
    pub fn from_parts(contract: &Contract, fields: &[Field]) -> Self {
        let documents = contract
            .documents
            .iter()
            .map(|d| DocumentRecord {
                id: d.id.clone(),
                filename: d.filename.clone(),
                original_path: d.original_path.clone(),
                page_count: d.page_count,
                fields: fields
                    .iter()
                    .filter(|f| f.document_id == d.id)
                    .map(FieldRecord::from_field)
                    .collect(),
            })
            .collect();

        Self {
            id: contract.id.clone(),
            title: contract.title.clone(),
            status: contract.status,
            documents,
            signers: contract.signers.iter().map(SignerRecord::from).collect(),
        }
    }

    pub fn into_snapshot(self) -> Result<ContractSnapshot, WireError> {
        let mut documents = Vec::with_capacity(self.documents.len());
        let mut fields = Vec::new();
        for record in self.documents {
            for field in record.fields {
                fields.push(field.into_field()?);
            }
            documents.push(Document {
                id: record.id,
                filename: record.filename,
                original_path: record.original_path,
                page_count: record.page_count,
            });
        }

        Ok(ContractSnapshot {
            contract: Contract {
                id: self.id,
                title: self.title,
                status: self.status,
                documents,
                signers: self.signers.into_iter().map(Signer::from).collect(),
            },
            fields,
        })
    }
}

/// Response of the contract send endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub status: ContractStatus,
}

/// Error body returned by the server on non-success statuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

/// Whole points serialize as integers, so `50.0` travels as `50`
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

// Formatted by hand to keep key order stable (x before y, width before height)
pub fn encode_position(position: &Position) -> String {
    format!(
        r#"{{"x":{},"y":{}}}"#,
        number(position.x),
        number(position.y)
    )
}

pub fn encode_size(size: &Size) -> String {
    format!(
        r#"{{"width":{},"height":{}}}"#,
        number(size.width),
        number(size.height)
    )
}

pub fn decode_position(raw: &str) -> Result<Position, WireError> {
    serde_json::from_str(raw).map_err(|e| WireError::Malformed {
        attribute: "position",
        reason: e.to_string(),
    })
}

pub fn decode_size(raw: &str) -> Result<Size, WireError> {
    serde_json::from_str(raw).map_err(|e| WireError::Malformed {
        attribute: "size",
        reason: e.to_string(),
    })
}

pub fn decode_pages(raw: &str) -> Result<PageSpec, WireError> {
    PageSpec::parse(raw).map_err(|e| WireError::Malformed {
        attribute: "pages",
        reason: e.to_string(),
    })
}

/// Distinguish an absent key (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

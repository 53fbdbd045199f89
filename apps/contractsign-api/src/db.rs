//! SQLite persistence for contracts and their fields

use anyhow::anyhow;
use chrono::Utc;
use contractsign_core::wire::{encode_position, encode_size, FieldRecord};
use contractsign_core::{
    Contract, ContractId, ContractSnapshot, ContractStatus, Document, DocumentId, Field, FieldId,
    FieldType, Signer, SignerId, SignerRole,
};
use sqlx::sqlite::SqlitePool;

use crate::error::ApiError;
use crate::models::{ContractRow, DocumentRow, FieldRow, SignerRow};

/// Load a contract with its documents, signers and every field across its
/// documents, in insertion order
pub async fn load_snapshot(
    db: &SqlitePool,
    contract_id: &ContractId,
) -> Result<ContractSnapshot, ApiError> {
    let row = sqlx::query_as::<_, ContractRow>(
        "SELECT id, title, status FROM contracts WHERE id = ?",
    )
    .bind(contract_id.as_str())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::ContractNotFound(contract_id.to_string()))?;

    let documents = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, filename, original_path, page_count
        FROM documents WHERE contract_id = ? ORDER BY sort_order
        "#,
    )
    .bind(contract_id.as_str())
    .fetch_all(db)
    .await?;

    let signers = sqlx::query_as::<_, SignerRow>(
        r#"
        SELECT id, name, email, signer_type
        FROM signers WHERE contract_id = ? ORDER BY sort_order
        "#,
    )
    .bind(contract_id.as_str())
    .fetch_all(db)
    .await?;

    let fields = sqlx::query_as::<_, FieldRow>(
        r#"
        SELECT f.id, f.document_id, f.signer_id, f.field_type, f.pages, f.position, f.size, f.content
        FROM fields f
        JOIN documents d ON d.id = f.document_id
        WHERE d.contract_id = ?
        ORDER BY f.rowid
        "#,
    )
    .bind(contract_id.as_str())
    .fetch_all(db)
    .await?;

    let contract = Contract {
        id: ContractId::new(row.id),
        title: row.title,
        status: ContractStatus::parse(&row.status)
            .ok_or_else(|| anyhow!("unknown contract status {:?}", row.status))?,
        documents: documents
            .into_iter()
            .map(document_from_row)
            .collect::<Result<_, _>>()?,
        signers: signers
            .into_iter()
            .map(signer_from_row)
            .collect::<Result<_, _>>()?,
    };
    let fields = fields
        .into_iter()
        .map(field_from_row)
        .collect::<Result<_, _>>()?;

    Ok(ContractSnapshot { contract, fields })
}

fn document_from_row(row: DocumentRow) -> Result<Document, ApiError> {
    Ok(Document {
        id: DocumentId::new(row.id),
        filename: row.filename,
        original_path: row.original_path,
        page_count: u32::try_from(row.page_count)
            .map_err(|_| anyhow!("invalid page count {}", row.page_count))?,
    })
}

fn signer_from_row(row: SignerRow) -> Result<Signer, ApiError> {
    Ok(Signer {
        id: SignerId::new(row.id),
        name: row.name,
        email: row.email,
        role: SignerRole::parse(&row.signer_type)
            .ok_or_else(|| anyhow!("unknown signer type {:?}", row.signer_type))?,
    })
}

fn field_from_row(row: FieldRow) -> Result<Field, ApiError> {
    let field_type = FieldType::parse(&row.field_type)
        .ok_or_else(|| anyhow!("unknown field type {:?}", row.field_type))?;
    let record = FieldRecord {
        id: FieldId::new(row.id),
        document_id: DocumentId::new(row.document_id),
        signer_id: row.signer_id.map(SignerId::new),
        field_type,
        pages: row.pages,
        position: row.position,
        size: row.size,
        content: row.content,
    };
    Ok(record.into_field().map_err(anyhow::Error::new)?)
}

pub async fn contract_of_document(
    db: &SqlitePool,
    document_id: &DocumentId,
) -> Result<Option<ContractId>, ApiError> {
    let id: Option<String> = sqlx::query_scalar("SELECT contract_id FROM documents WHERE id = ?")
        .bind(document_id.as_str())
        .fetch_optional(db)
        .await?;
    Ok(id.map(ContractId::new))
}

pub async fn contract_of_field(
    db: &SqlitePool,
    field_id: &FieldId,
) -> Result<Option<ContractId>, ApiError> {
    let id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT d.contract_id FROM fields f
        JOIN documents d ON d.id = f.document_id
        WHERE f.id = ?
        "#,
    )
    .bind(field_id.as_str())
    .fetch_optional(db)
    .await?;
    Ok(id.map(ContractId::new))
}

pub async fn insert_contract(db: &SqlitePool, contract: &Contract) -> Result<(), ApiError> {
    let now = Utc::now().to_rfc3339();
    let mut tx = db.begin().await?;

    sqlx::query(
        "INSERT INTO contracts (id, title, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(contract.id.as_str())
    .bind(&contract.title)
    .bind(contract.status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for (order, document) in contract.documents.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO documents (id, contract_id, filename, original_path, page_count, sort_order)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document.id.as_str())
        .bind(contract.id.as_str())
        .bind(&document.filename)
        .bind(&document.original_path)
        .bind(i64::from(document.page_count))
        .bind(order as i64)
        .execute(&mut *tx)
        .await?;
    }

    for (order, signer) in contract.signers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO signers (id, contract_id, name, email, signer_type, sort_order)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(signer.id.as_str())
        .bind(contract.id.as_str())
        .bind(&signer.name)
        .bind(&signer.email)
        .bind(signer.role.as_str())
        .bind(order as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn insert_field(db: &SqlitePool, field: &Field) -> Result<(), ApiError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO fields (id, document_id, signer_id, field_type, pages, position, size, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(field.id.as_str())
    .bind(field.document_id.as_str())
    .bind(field.signer_id.as_ref().map(|s| s.as_str()))
    .bind(field.field_type.as_str())
    .bind(field.pages.as_str())
    .bind(encode_position(&field.position))
    .bind(encode_size(&field.size))
    .bind(field.content.as_deref())
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;
    Ok(())
}

/// Overwrite every mutable attribute. Last write wins.
pub async fn update_field(db: &SqlitePool, field: &Field) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE fields
        SET signer_id = ?, field_type = ?, pages = ?, position = ?, size = ?, content = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(field.signer_id.as_ref().map(|s| s.as_str()))
    .bind(field.field_type.as_str())
    .bind(field.pages.as_str())
    .bind(encode_position(&field.position))
    .bind(encode_size(&field.size))
    .bind(field.content.as_deref())
    .bind(Utc::now().to_rfc3339())
    .bind(field.id.as_str())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_field(db: &SqlitePool, field_id: &FieldId) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM fields WHERE id = ?")
        .bind(field_id.as_str())
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_status(
    db: &SqlitePool,
    contract_id: &ContractId,
    status: ContractStatus,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE contracts SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(contract_id.as_str())
        .execute(db)
        .await?;
    Ok(())
}

//! HTTP endpoint tests using axum-test over an in-memory database

use axum::http::StatusCode;
use axum_test::TestServer;
use contractsign_core::wire::{ContractRecord, FieldRecord, SendResponse};
use contractsign_core::ContractStatus;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{DeleteFieldResponse, ReadinessResponse};
use crate::{build_router, AppState};

async fn create_test_server(enforce_readiness: bool) -> TestServer {
    let state = AppState::connect("sqlite::memory:", enforce_readiness)
        .await
        .unwrap();
    TestServer::new(build_router(Arc::new(state))).unwrap()
}

/// Draft contract: one 3-page document, two signers and a viewer
async fn seed_contract(server: &TestServer) -> ContractRecord {
    let response = server
        .post("/api/contracts")
        .json(&json!({
            "title": "Service agreement",
            "documents": [
                { "filename": "agreement.pdf", "originalPath": "uploads/agreement.pdf", "pageCount": 3 }
            ],
            "signers": [
                { "name": "Ada", "email": "ada@example.com", "signerType": "signer" },
                { "name": "Brook", "email": "brook@example.com" },
                { "name": "Cy", "email": "cy@example.com", "signerType": "viewer" }
            ]
        }))
        .await;
    response.assert_status_ok();
    response.json::<ContractRecord>()
}

fn signature_for(contract: &ContractRecord, signer: usize) -> Value {
    json!({
        "documentId": contract.documents[0].id,
        "signerId": contract.signers[signer].id,
        "fieldType": "signature",
        "pages": "1",
        "position": "{\"x\":50,\"y\":700}",
        "size": "{\"width\":200,\"height\":50}",
        "content": null
    })
}

#[tokio::test]
async fn test_health_returns_ok() {
    let server = create_test_server(true).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_seed_and_fetch_contract() {
    let server = create_test_server(true).await;
    let seeded = seed_contract(&server).await;
    assert_eq!(seeded.status, ContractStatus::Draft);
    assert_eq!(seeded.signers.len(), 3);

    let response = server
        .get(&format!("/api/contracts/{}", seeded.id))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<ContractRecord>(), seeded);
}

#[tokio::test]
async fn test_unknown_contract_is_404() {
    let server = create_test_server(true).await;
    let response = server.get("/api/contracts/missing").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let json = response.json::<Value>();
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_create_field_keeps_wire_encoding() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;

    let response = server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await;
    response.assert_status_ok();
    let field = response.json::<FieldRecord>();
    assert!(!field.id.as_str().is_empty());
    assert_eq!(field.position, r#"{"x":50,"y":700}"#);
    assert_eq!(field.size, r#"{"width":200,"height":50}"#);

    let fetched = server
        .get(&format!("/api/contracts/{}", contract.id))
        .await
        .json::<ContractRecord>();
    assert_eq!(fetched.documents[0].fields, vec![field]);
}

#[tokio::test]
async fn test_create_field_validation() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;

    let mut zero_width = signature_for(&contract, 0);
    zero_width["size"] = json!("{\"width\":0,\"height\":50}");
    server
        .post("/api/fields")
        .json(&zero_width)
        .await
        .assert_status_bad_request();

    let mut past_end = signature_for(&contract, 0);
    past_end["pages"] = json!("2-4");
    server
        .post("/api/fields")
        .json(&past_end)
        .await
        .assert_status_bad_request();

    let mut garbled = signature_for(&contract, 0);
    garbled["position"] = json!("not json");
    server
        .post("/api/fields")
        .json(&garbled)
        .await
        .assert_status_bad_request();

    let mut stranger = signature_for(&contract, 0);
    stranger["signerId"] = json!("someone-else");
    server
        .post("/api/fields")
        .json(&stranger)
        .await
        .assert_status_bad_request();

    let mut orphan = signature_for(&contract, 0);
    orphan["documentId"] = json!("no-such-document");
    server
        .post("/api/fields")
        .json(&orphan)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_and_clear_signer() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;
    let field = server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await
        .json::<FieldRecord>();

    let moved = server
        .put("/api/fields")
        .json(&json!({ "fieldId": field.id, "position": "{\"x\":130,\"y\":602}" }))
        .await;
    moved.assert_status_ok();
    let moved = moved.json::<FieldRecord>();
    assert_eq!(moved.position, r#"{"x":130,"y":602}"#);
    assert_eq!(moved.size, field.size);
    assert_eq!(moved.signer_id, field.signer_id);

    let cleared = server
        .put("/api/fields")
        .json(&json!({ "fieldId": field.id, "signerId": null }))
        .await
        .json::<FieldRecord>();
    assert_eq!(cleared.signer_id, None);
    assert_eq!(cleared.position, moved.position);
}

#[tokio::test]
async fn test_update_unknown_field_is_404() {
    let server = create_test_server(true).await;
    server
        .put("/api/fields")
        .json(&json!({ "fieldId": "ghost", "fieldType": "date" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;
    let field = server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await
        .json::<FieldRecord>();

    let first = server
        .delete(&format!("/api/fields?fieldId={}", field.id))
        .await;
    first.assert_status_ok();
    assert!(first.json::<DeleteFieldResponse>().deleted);

    let second = server
        .delete(&format!("/api/fields?fieldId={}", field.id))
        .await;
    second.assert_status_ok();
    assert!(!second.json::<DeleteFieldResponse>().deleted);
}

#[tokio::test]
async fn test_readiness_names_missing_signers() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;
    server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await
        .assert_status_ok();

    let readiness = server
        .get(&format!("/api/contracts/{}/readiness", contract.id))
        .await
        .json::<ReadinessResponse>();
    assert!(!readiness.ready);
    assert_eq!(readiness.missing_signers.len(), 1);
    assert_eq!(readiness.missing_signers[0].name, "Brook");
    assert_eq!(
        readiness.message.as_deref(),
        Some("Each signer needs at least one signature field. Missing: Brook")
    );
}

#[tokio::test]
async fn test_send_requires_readiness_when_enforced() {
    let server = create_test_server(true).await;
    let contract = seed_contract(&server).await;
    server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await
        .assert_status_ok();

    let send_path = format!("/api/contracts/{}/send", contract.id);
    let refused = server.post(&send_path).await;
    refused.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(refused.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("Brook"));

    server
        .post("/api/fields")
        .json(&signature_for(&contract, 1))
        .await
        .assert_status_ok();
    let sent = server.post(&send_path).await;
    sent.assert_status_ok();
    assert_eq!(sent.json::<SendResponse>().status, ContractStatus::Sent);
}

#[tokio::test]
async fn test_send_without_enforcement() {
    let server = create_test_server(false).await;
    let contract = seed_contract(&server).await;

    let sent = server
        .post(&format!("/api/contracts/{}/send", contract.id))
        .await;
    sent.assert_status_ok();
    assert_eq!(sent.json::<SendResponse>().status, ContractStatus::Sent);
}

#[tokio::test]
async fn test_sent_contract_is_locked() {
    let server = create_test_server(false).await;
    let contract = seed_contract(&server).await;
    let field = server
        .post("/api/fields")
        .json(&signature_for(&contract, 0))
        .await
        .json::<FieldRecord>();
    let send_path = format!("/api/contracts/{}/send", contract.id);
    server.post(&send_path).await.assert_status_ok();

    server
        .post("/api/fields")
        .json(&signature_for(&contract, 1))
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .put("/api/fields")
        .json(&json!({ "fieldId": field.id, "fieldType": "initials" }))
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .delete(&format!("/api/fields?fieldId={}", field.id))
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .post(&send_path)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_seed_rejects_empty_documents() {
    let server = create_test_server(true).await;
    server
        .post("/api/contracts")
        .json(&json!({
            "title": "Blank",
            "documents": [{ "filename": "empty.pdf", "pageCount": 0 }]
        }))
        .await
        .assert_status_bad_request();
}

mod router {
    //! Router-level checks without a test server

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::{build_router, AppState};

    #[tokio::test]
    async fn test_health_via_oneshot() {
        let state = AppState::connect("sqlite::memory:", true).await.unwrap();
        let response = build_router(Arc::new(state))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }
}

//! HTTP document store tests against a mock backend

use crate::common::MockBackend;
use engageiq_sync::client::remote::DocumentStore;
use engageiq_sync::shared::{DocumentType, Payload};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_create_posts_normalized_document() {
    let backend = MockBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/post"))
        .and(body_partial_json(json!({
            "id": "p1",
            "type": "post",
            "data": {"id": "p1", "type": "post", "title": "hi"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "type": "post",
            "data": {"id": "p1", "type": "post", "title": "hi"}
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let document = Payload::new("p1", DocumentType::Post)
        .with_field("title", "hi")
        .with_field("_pending", true)
        .normalize()
        .unwrap();
    let stored = backend.store.create(document).await.unwrap();
    assert_eq!(stored.id, "p1");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let backend = MockBackend::start_with_token(Some("secret")).await;
    Mock::given(method("GET"))
        .and(path("/api/post"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let documents = backend.store.query_by_type("post").await.unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn test_read_maps_404_to_none() {
    let backend = MockBackend::start().await;
    backend.fail_path("GET", "/api/audit/award-missing", 404).await;
    backend
        .serve_document("audit", "award-present", json!({"points": 5}))
        .await;

    assert!(backend.store.read("award-missing", "audit").await.unwrap().is_none());
    let present = backend.store.read("award-present", "audit").await.unwrap().unwrap();
    assert_eq!(present.data["points"], json!(5));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let backend = MockBackend::start().await;
    backend.fail_path("POST", "/api/post", 503).await;

    let document = Payload::new("p1", DocumentType::Post).normalize().unwrap();
    let error = backend.store.create(document).await.unwrap_err();
    assert!(error.is_transient());
    assert!(error.to_string().contains("503"));
}

#[tokio::test]
async fn test_writer_over_http_round_trip() {
    use engageiq_sync::client::offline::{RemoteWriter, WriteOutcome};
    use engageiq_sync::client::remote::MemoryErrorReporter;
    use std::sync::Arc;

    let backend = MockBackend::start().await;
    backend.accept_creates("comment").await;

    let writer = RemoteWriter::new(Arc::new(backend.store.clone()), Arc::new(MemoryErrorReporter::new()));
    let outcome = writer
        .write(&Payload::new("c1", DocumentType::Comment).with_field("body", "nice"))
        .await;
    assert_eq!(outcome, WriteOutcome::Delivered);
}

//! Mock server helpers for the HTTP document store
//!
//! Wraps a `wiremock` server with the EngageIQ REST endpoints.

use engageiq_sync::client::config::Config;
use engageiq_sync::client::remote::HttpDocumentStore;
use engageiq_sync::shared::AppConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Running mock backend and a store pointed at it
pub struct MockBackend {
    pub server: MockServer,
    pub store: HttpDocumentStore,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::start_with_token(None).await
    }

    pub async fn start_with_token(token: Option<&str>) -> Self {
        let server = MockServer::start().await;
        let mut config = Config::with_builder(
            AppConfig::builder()
                .server_url(server.uri())
                .request_timeout_secs(5),
        )
        .expect("mock server config");
        config.set_token(token.map(str::to_string));
        let store = HttpDocumentStore::new(&config).expect("http store");
        Self { server, store }
    }

    /// Echo every `POST /api/{doc_type}` body back with 201
    pub async fn accept_creates(&self, doc_type: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/api/{}", doc_type)))
            .respond_with(|req: &wiremock::Request| {
                let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
                ResponseTemplate::new(201).set_body_json(body)
            })
            .mount(&self.server)
            .await;
    }

    /// Answer `GET /api/{doc_type}/{id}` with a stored document
    pub async fn serve_document(&self, doc_type: &str, id: &str, data: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{}/{}", doc_type, id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "type": doc_type,
                "data": data,
            })))
            .mount(&self.server)
            .await;
    }

    /// Fail every request to a path with the given status
    pub async fn fail_path(&self, http_method: &str, request_path: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

//! REST Document Store Client
//!
//! Talks to the EngageIQ backend, which exposes one CRUD collection per
//! document type:
//!
//! - `POST /api/{type}` upserts a `{ id, type, data }` document and echoes it
//! - `GET /api/{type}/{id}` reads one document (404 when absent)
//! - `GET /api/{type}` lists every document of the type

use crate::client::config::Config;
use crate::client::remote::DocumentStore;
use crate::shared::{RemoteDocument, SyncError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;

/// Document store backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    base: Url,
    token: Option<String>,
    client: Client,
}

impl HttpDocumentStore {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        let base = Url::parse(config.server_url())
            .map_err(|e| SyncError::config(format!("invalid server URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.app().request_timeout_secs))
            .build()?;

        Ok(Self {
            base,
            token: config.get_token().cloned(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::config(format!("server URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(SyncError::remote_status(
            status.as_u16(),
            format!("Request failed: {} - {}", status, error_text),
        ))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create(&self, document: RemoteDocument) -> Result<RemoteDocument, SyncError> {
        let url = self.endpoint(&[&document.doc_type])?;
        let response = self
            .authorize(self.client.post(url))
            .json(&document)
            .send()
            .await?;

        let persisted = Self::check(response)
            .await?
            .json::<RemoteDocument>()
            .await
            .map_err(|e| SyncError::serialization(format!("Failed to parse response: {}", e)))?;
        tracing::debug!("[Store] Upserted {} {}", persisted.doc_type, persisted.id);
        Ok(persisted)
    }

    async fn read(&self, id: &str, doc_type: &str) -> Result<Option<RemoteDocument>, SyncError> {
        let url = self.endpoint(&[doc_type, id])?;
        let response = self.authorize(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document = Self::check(response)
            .await?
            .json::<RemoteDocument>()
            .await
            .map_err(|e| SyncError::serialization(format!("Failed to parse response: {}", e)))?;
        Ok(Some(document))
    }

    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<RemoteDocument>, SyncError> {
        let url = self.endpoint(&[doc_type])?;
        let response = self.authorize(self.client.get(url)).send().await?;

        Self::check(response)
            .await?
            .json::<Vec<RemoteDocument>>()
            .await
            .map_err(|e| SyncError::serialization(format!("Failed to parse response: {}", e)))
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use vitality_core::{Document, RemoteError, RemoteStore};

use crate::server::{DocumentList, DocumentRef, FieldQuery, RecentQuery};

/// Remote Store client for a `vitality serve` instance.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "vitality-cli/{} (progress sync)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let request = match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(transport_error)?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::PermissionDenied),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            status if !status.is_success() => {
                Err(RemoteError::Transport(format!("server returned {status}")))
            }
            _ => Ok(response),
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport(err.to_string())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Document>, RemoteError> {
        let query = DocumentRef {
            collection: collection.to_string(),
            id: doc_id.to_string(),
        };
        let request = self.client.get(self.url("/api/documents")).query(&query);
        match self.send_json(request).await {
            Ok(doc) => Ok(Some(doc)),
            Err(RemoteError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn merge_write(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Document,
    ) -> Result<(), RemoteError> {
        let query = DocumentRef {
            collection: collection.to_string(),
            id: doc_id.to_string(),
        };
        let request = self
            .client
            .patch(self.url("/api/documents"))
            .query(&query)
            .json(&partial);
        self.send(request).await.map(|_| ())
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: Value,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError> {
        let body = FieldQuery {
            collection: collection.to_string(),
            field: field.to_string(),
            value,
            limit,
        };
        let request = self.client.post(self.url("/api/query")).json(&body);
        let list: DocumentList = self.send_json(request).await?;
        Ok(list.documents)
    }

    async fn query_recent(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> Result<Vec<Document>, RemoteError> {
        let body = RecentQuery {
            collection: collection.to_string(),
            order_field: order_field.to_string(),
            limit,
        };
        let request = self.client.post(self.url("/api/recent")).json(&body);
        let list: DocumentList = self.send_json(request).await?;
        Ok(list.documents)
    }
}

/// Stand-in when no `remote_url` is configured. The session is local-only
/// in that case, so the engine never calls it.
pub struct NoRemote;

fn not_configured() -> RemoteError {
    RemoteError::Transport("no remote_url configured".to_string())
}

#[async_trait]
impl RemoteStore for NoRemote {
    async fn get_document(&self, _: &str, _: &str) -> Result<Option<Document>, RemoteError> {
        Err(not_configured())
    }

    async fn merge_write(&self, _: &str, _: &str, _: Document) -> Result<(), RemoteError> {
        Err(not_configured())
    }

    async fn query_by_field(
        &self,
        _: &str,
        _: &str,
        _: Value,
        _: usize,
    ) -> Result<Vec<Document>, RemoteError> {
        Err(not_configured())
    }

    async fn query_recent(&self, _: &str, _: &str, _: usize) -> Result<Vec<Document>, RemoteError> {
        Err(not_configured())
    }
}

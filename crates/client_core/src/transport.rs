//! Transport collaborators. The controller only ever talks to these traits;
//! [`HttpCollectionTransport`] is the reqwest-backed implementation.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::{ActionResult, DeleteRequest, SearchRequest, SearchResult};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;

/// Relative to the server url, so a path prefix on it is kept.
pub const SEARCH_PATH: &str = "users/search";
pub const DELETE_PATH: &str = "users/delete";

#[async_trait]
pub trait CollectionTransport<R>: Send + Sync {
    async fn submit(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<SearchResult<R>, TransportError>;
}

#[async_trait]
pub trait DeleteTransport: Send + Sync {
    async fn delete(
        &self,
        request: DeleteRequest,
        cancel: CancellationToken,
    ) -> Result<ActionResult, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpCollectionTransport {
    http: Client,
    search_url: Url,
    delete_url: Url,
}

impl HttpCollectionTransport {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(server_url)
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self::with_endpoints(
            Client::new(),
            base.join(SEARCH_PATH)?,
            base.join(DELETE_PATH)?,
        ))
    }

    pub fn with_endpoints(http: Client, search_url: Url, delete_url: Url) -> Self {
        Self {
            http,
            search_url,
            delete_url,
        }
    }

    async fn post_form<F, T>(
        &self,
        url: &Url,
        form: &F,
        cancel: CancellationToken,
    ) -> Result<T, TransportError>
    where
        F: Serialize + Sync,
        T: DeserializeOwned,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.send_form(url, form) => result.map_err(TransportError::Failed),
        }
    }

    // Failure results arrive with 4xx statuses, so the body is decoded
    // regardless of the status code.
    async fn send_form<F, T>(&self, url: &Url, form: &F) -> anyhow::Result<T>
    where
        F: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(url.clone())
            .form(form)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;
        serde_json::from_slice(&body)
            .with_context(|| format!("unexpected response from {url} (status {status})"))
    }
}

#[async_trait]
impl<R> CollectionTransport<R> for HttpCollectionTransport
where
    R: DeserializeOwned + Send + 'static,
{
    async fn submit(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<SearchResult<R>, TransportError> {
        self.post_form(&self.search_url, &request, cancel).await
    }
}

#[async_trait]
impl DeleteTransport for HttpCollectionTransport {
    async fn delete(
        &self,
        request: DeleteRequest,
        cancel: CancellationToken,
    ) -> Result<ActionResult, TransportError> {
        self.post_form(&self.delete_url, &request, cancel).await
    }
}

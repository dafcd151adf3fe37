//! Upstream Module
//!
//! The gateway treats its origin as an opaque asynchronous fetch. Transport
//! policy (timeouts, TLS, retries) belongs to the implementation behind the
//! trait, never to the caching strategies.

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;

use crate::gateway::resources::CachedResponse;

// == Upstream Trait ==
/// An origin the gateway fetches from.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs a GET for the given target (path plus query).
    async fn fetch(&self, target: &str) -> anyhow::Result<CachedResponse>;

    /// Forwards a non-GET request verbatim.
    async fn forward(
        &self,
        method: Method,
        target: &str,
        body: Bytes,
    ) -> anyhow::Result<CachedResponse>;
}

// == HTTP Upstream ==
/// Reqwest-backed upstream pointed at a base URL.
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, target: &str) -> String {
        format!("{}{}", self.base_url, target)
    }

    async fn into_cached(response: reqwest::Response) -> anyhow::Result<CachedResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(CachedResponse::new(status, headers, body))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, target: &str) -> anyhow::Result<CachedResponse> {
        let response = self.client.get(self.url_for(target)).send().await?;
        Self::into_cached(response).await
    }

    async fn forward(
        &self,
        method: Method,
        target: &str,
        body: Bytes,
    ) -> anyhow::Result<CachedResponse> {
        let response = self
            .client
            .request(method, self.url_for(target))
            .body(body)
            .send()
            .await?;
        Self::into_cached(response).await
    }
}

// Transport contract and shared HTTP client configuration.
//
// The core never talks to reqwest directly. It depends on the object-safe
// `Transport` trait, so hosts inject `HttpTransport` in production and a
// scripted fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ErrorInfo;

/// Request budget applied by the transport. The core enforces no timeout itself.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Query-string pairs, in order.
pub type Query<'a> = &'a [(&'a str, String)];

/// The HTTP verbs the core consumes.
///
/// Every method resolves to the decoded JSON payload of a 2xx response, or
/// rejects with a normalized [`ErrorInfo`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: Query<'_>) -> Result<Value, ErrorInfo>;

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ErrorInfo>;

    async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ErrorInfo>;

    async fn delete(&self, path: &str, query: Query<'_>) -> Result<Value, ErrorInfo>;
}

/// Typed helpers over any [`Transport`].
#[async_trait]
pub trait TransportExt: Transport {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<T, ErrorInfo> {
        decode(self.get(path, query).await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ErrorInfo> {
        let body = body.map(encode).transpose()?;
        decode(self.post(path, body).await?)
    }

    async fn put_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ErrorInfo> {
        let body = body.map(encode).transpose()?;
        decode(self.put(path, body).await?)
    }

    async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<T, ErrorInfo> {
        decode(self.delete(path, query).await?)
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ErrorInfo> {
    serde_json::from_value(value)
        .map_err(|e| ErrorInfo::new(format!("Deserialization error: {e}"), "INVALID_RESPONSE", 0))
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ErrorInfo> {
    serde_json::to_value(body)
        .map_err(|e| ErrorInfo::new(format!("Serialization error: {e}"), "INVALID_REQUEST", 0))
}

// ── Client configuration ────────────────────────────────────────────

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout. Fixed per deployment, not per call.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("crmsync/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| crate::error::Error::Client(e.to_string()))
    }
}

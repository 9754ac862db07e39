// reqwest-backed `Transport`.
//
// Owns the bearer credential for the session and the host-supplied hook
// that runs when the server rejects that credential.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, ErrorInfo};
use crate::transport::{Query, Transport, TransportConfig};

// ── Auth failure hook ───────────────────────────────────────────────

/// Callback invoked after a 401 has cleared the stored credential.
///
/// The host decides what "go log in again" means: redirect, prompt, exit.
#[derive(Clone)]
pub struct AuthFailureHook(Arc<dyn Fn() + Send + Sync>);

impl AuthFailureHook {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A hook that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    fn fire(&self) {
        (self.0)();
    }
}

impl fmt::Debug for AuthFailureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthFailureHook")
    }
}

impl Default for AuthFailureHook {
    fn default() -> Self {
        Self::noop()
    }
}

// ── HttpTransport ───────────────────────────────────────────────────

/// HTTP client for the crmsync REST API.
///
/// Attaches `Authorization: Bearer <token>` when a token is set, decodes
/// JSON payloads, and normalizes every failure into an [`ErrorInfo`].
/// The token lives in memory only; it is gone when the process exits.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    token: ArcSwapOption<SecretString>,
    on_unauthorized: AuthFailureHook,
}

impl HttpTransport {
    /// Create a transport from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        config: &TransportConfig,
        on_unauthorized: AuthFailureHook,
    ) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, on_unauthorized))
    }

    /// Create a transport around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, on_unauthorized: AuthFailureHook) -> Self {
        Self {
            http,
            base_url,
            token: ArcSwapOption::empty(),
            on_unauthorized,
        }
    }

    /// Convenience constructor from a URL string.
    pub fn from_url(
        base_url: &str,
        config: &TransportConfig,
        on_unauthorized: AuthFailureHook,
    ) -> Result<Self, Error> {
        Self::new(Url::parse(base_url)?, config, on_unauthorized)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Credential ───────────────────────────────────────────────────

    pub fn set_token(&self, token: SecretString) {
        self.token.store(Some(Arc::new(token)));
    }

    pub fn token(&self) -> Option<Arc<SecretString>> {
        self.token.load_full()
    }

    pub fn clear_token(&self) {
        self.token.store(None);
    }

    pub fn has_token(&self) -> bool {
        self.token.load().is_some()
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// `{base}{path}`, keeping any path prefix on the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut req = self.http.request(method.clone(), url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = self.token.load_full() {
            req = req.bearer_auth(token.expose_secret());
        }
        if method == Method::POST || method == Method::PUT {
            req = req.json(&body.unwrap_or_else(|| Value::Object(serde_json::Map::new())));
        }

        let resp = req.send().await?;
        let status = resp.status();

        // The session ends on a 401 whether or not the body can be read.
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "credential rejected, clearing session");
            self.clear_token();
            self.on_unauthorized.fire();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Unauthorized { body });
        }

        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: Query<'_>) -> Result<Value, ErrorInfo> {
        Ok(self.send(Method::GET, path, query, None).await?)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ErrorInfo> {
        Ok(self.send(Method::POST, path, &[], body).await?)
    }

    async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ErrorInfo> {
        Ok(self.send(Method::PUT, path, &[], body).await?)
    }

    async fn delete(&self, path: &str, query: Query<'_>) -> Result<Value, ErrorInfo> {
        Ok(self.send(Method::DELETE, path, query, None).await?)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

//! External collaborator seams: HTTP transport, session access, and time.
//!
//! The engine never talks to the network or the system clock directly; it
//! goes through these traits so tests can substitute deterministic fakes.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;

/// HTTP-shaped transport consumed by the remote access layer.
///
/// Implementations must fail (rather than return a body) on non-2xx
/// responses so the caller can tell a degraded backend from a healthy one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;
    async fn post(&self, path: &str, body: Value) -> Result<Value>;
    async fn delete(&self, path: &str) -> Result<Value>;
}

/// Synchronous accessor for the session token. `None` means logged out.
pub trait SessionProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Time source for TTL checks and relative-age computation.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time via chrono.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Production transport: reqwest against the notification backend, with
/// bearer auth pulled from the session provider on every call.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        let client = Client::builder()
            .user_agent("Roost/0.1 (Notification Sync Engine)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> Option<String> {
        self.session.token()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut req = self.client.get(self.url(path)).query(params);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let mut req = self.client.delete(self.url(path));
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}

/// Session provider backed by a mutable in-process slot.
///
/// Host applications that keep the token elsewhere can implement
/// [`SessionProvider`] directly; this covers the common case and doubles as
/// the login/logout toggle in tests.
#[derive(Default)]
pub struct TokenSlot {
    token: std::sync::RwLock<Option<String>>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }
}

impl SessionProvider for TokenSlot {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

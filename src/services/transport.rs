//! HTTP transport for the Nessie API
//!
//! `Transport` is the seam between the API client and the wire. The
//! reqwest-backed `HttpTransport` talks to the real service;
//! `MemoryTransport` serves canned bodies for demos and tests.

use crate::config::AppConfig;
use crate::types::{FetchError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Raw request/response exchange with the banking API
pub trait Transport: Send + Sync {
    /// GET `path` and return the body of a successful response
    fn get(&self, path: &str) -> impl Future<Output = Result<String>> + Send;

    /// POST a JSON body to `path` and return the body of a successful response
    fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Transport backed by an async reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| FetchError::Config("live mode requires an API key".into()))?;
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a response to its body, or to the error its status stands for
    async fn into_body(path: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;

        match status.as_u16() {
            200 | 201 => Ok(body),
            404 => Err(FetchError::NotFound(path.to_string())),
            code => Err(FetchError::Http {
                status: code,
                path: path.to_string(),
                body,
            }),
        }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<String> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        Self::into_body(path, response).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        Self::into_body(path, response).await
    }
}

/// Canned reply for one route
#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Status(u16, String),
    Unreachable,
}

/// In-memory transport with canned routes.
///
/// Unknown routes answer like a 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, serde_json::Value)>>,
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET path` with `body`
    pub fn with_body(self, path: &str, body: impl Into<String>) -> Self {
        self.set_body(path, body);
        self
    }

    /// Answer `POST path` with `body`
    pub fn with_post_body(self, path: &str, body: impl Into<String>) -> Self {
        self.set_reply("POST", path, Reply::Body(body.into()));
        self
    }

    /// Answer `GET path` with a non-success status
    pub fn with_status(self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.set_reply("GET", path, Reply::Status(status, body.into()));
        self
    }

    /// Fail `GET path` as if the network were down
    pub fn with_network_failure(self, path: &str) -> Self {
        self.set_reply("GET", path, Reply::Unreachable);
        self
    }

    /// Delay every reply for `GET path`
    pub fn with_delay(self, path: &str, delay: Duration) -> Self {
        lock(&self.delays).insert(route_key("GET", path), delay);
        self
    }

    /// Replace the `GET path` body, e.g. between two refreshes
    pub fn set_body(&self, path: &str, body: impl Into<String>) {
        self.set_reply("GET", path, Reply::Body(body.into()));
    }

    /// Requests seen so far, as `"METHOD path"`
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// JSON bodies posted so far
    pub fn posted(&self) -> Vec<(String, serde_json::Value)> {
        lock(&self.posted).clone()
    }

    fn set_reply(&self, method: &str, path: &str, reply: Reply) {
        lock(&self.routes).insert(route_key(method, path), reply);
    }

    async fn answer(&self, method: &str, path: &str) -> Result<String> {
        let key = route_key(method, path);
        lock(&self.requests).push(key.clone());

        let delay = lock(&self.delays).get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.routes).get(&key).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(404, _)) | None => Err(FetchError::NotFound(path.to_string())),
            Some(Reply::Status(status, body)) => Err(FetchError::Http {
                status,
                path: path.to_string(),
                body,
            }),
            Some(Reply::Unreachable) => {
                Err(FetchError::Network(format!("{} unreachable", path)))
            }
        }
    }
}

impl Transport for MemoryTransport {
    async fn get(&self, path: &str) -> Result<String> {
        self.answer("GET", path).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        lock(&self.posted).push((path.to_string(), body.clone()));
        self.answer("POST", path).await
    }
}

//! Async HTTP fetcher shared by every bridge.
//!
//! Wraps a single `reqwest::Client` with the connect timeout all bridges
//! use. Calls return `Result` and never panic into the caller; a
//! non-success status is reported as [`BridgeError::Status`]. Request URLs
//! are stripped from errors because several of them carry bot tokens.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BridgeError, Result};

/// Connect timeout applied to every request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total timeout for short requests (posts, lookups).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("chat-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "[Http] Falling back to default client");
                Client::new()
            });
        Self { client }
    }

    /// Start a request with an explicit total timeout.
    pub fn request(&self, method: Method, url: &str, timeout: Duration) -> RequestBuilder {
        self.client.request(method, url).timeout(timeout)
    }

    pub fn get(&self, url: &str, timeout: Duration) -> RequestBuilder {
        self.request(Method::GET, url, timeout)
    }

    pub fn post(&self, url: &str, timeout: Duration) -> RequestBuilder {
        self.request(Method::POST, url, timeout)
    }

    /// Send a request and return the body of a success response.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let host = response.url().host_str().unwrap_or_default().to_string();
            return Err(BridgeError::Status { status, host });
        }

        response
            .text()
            .await
            .map_err(|e| BridgeError::Transport(e.without_url()))
    }

    /// Send a request and decode a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a form body without waiting for the outcome.
    pub fn post_form_detached<F: Serialize + ?Sized>(&self, url: &str, form: &F, label: &'static str) {
        let request = self.post(url, REQUEST_TIMEOUT).form(form);
        self.spawn_detached(request, label);
    }

    /// POST a JSON body without waiting for the outcome.
    pub fn post_json_detached<B: Serialize + ?Sized>(&self, url: &str, body: &B, label: &'static str) {
        let request = self.post(url, REQUEST_TIMEOUT).json(body);
        self.spawn_detached(request, label);
    }

    /// Fire-and-forget send. Failures are logged at debug level and dropped.
    fn spawn_detached(&self, request: RequestBuilder, label: &'static str) {
        let fetcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = fetcher.send_text(request).await {
                tracing::debug!(request = label, error = %e, "[Http] Outbound send dropped");
            }
        });
    }
}

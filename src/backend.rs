use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ChatConfig;

/// `source` value marking a low-confidence answer.
pub const FALLBACK_SOURCE: &str = "fallback";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed reply: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Wire shape of a successful `POST /chat/` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub source: String,
}

impl ChatReply {
    /// True when the answer came from the fallback service rather than a
    /// primary knowledge source (`"faq"`, `"gpt"`).
    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }
}

/// Client for the remote Zimer chat service.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ChatBackend {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        Self::new(config.backend_url.clone(), timeout)
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/", self.base_url)
    }

    /// One question/answer exchange. No retries; transport errors,
    /// non-2xx statuses and undecodable bodies all surface as
    /// [`BackendError`].
    pub async fn ask(&self, message: &str) -> Result<ChatReply, BackendError> {
        let mut request = self
            .client
            .post(self.chat_url())
            .json(&ChatRequest { message });
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Short-timeout reachability probe against `GET /chat/health`.
    /// Informational only; never fails the caller.
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}/chat/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

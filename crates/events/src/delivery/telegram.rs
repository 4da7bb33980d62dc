//! Telegram Bot API relay.
//!
//! [`TelegramRelay`] posts a Markdown message through `sendMessage` for the
//! bot identified by the credential. A single attempt is made; failures are
//! logged and reported as `false`.

use async_trait::async_trait;
use serde::Deserialize;

use super::MessageRelay;

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for relay failures.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The underlying HTTP request failed (network, DNS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API returned a non-2xx status code.
    #[error("Telegram returned HTTP {0}")]
    HttpStatus(u16),

    /// The Bot API answered 2xx but reported `ok: false`.
    #[error("Telegram rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

// ---------------------------------------------------------------------------
// TelegramRelay
// ---------------------------------------------------------------------------

/// Sends caregiver messages through a Telegram bot.
pub struct TelegramRelay {
    client: reqwest::Client,
    api_url: String,
}

impl TelegramRelay {
    /// Create a relay against `api_url` (e.g. [`DEFAULT_API_URL`]).
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a relay reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, bot_token)
    }

    /// Execute a single `sendMessage` request and check the outcome.
    async fn try_send(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<(), RelayError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.endpoint(bot_token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::HttpStatus(response.status().as_u16()));
        }

        let parsed: ApiResponse = response.json().await?;
        if !parsed.ok {
            return Err(RelayError::Rejected(
                parsed.description.unwrap_or_else(|| "no description".into()),
            ));
        }
        Ok(())
    }
}

impl Default for TelegramRelay {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait]
impl MessageRelay for TelegramRelay {
    async fn send(&self, credential: &str, target: &str, text: &str) -> bool {
        if credential.trim().is_empty() || target.trim().is_empty() {
            tracing::debug!("Telegram relay skipped, credentials missing");
            return false;
        }
        match self.try_send(credential, target, text).await {
            Ok(()) => {
                tracing::info!(chat_id = target, "Telegram message delivered");
                true
            }
            Err(e) => {
                tracing::warn!(chat_id = target, error = %e, "Telegram delivery failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

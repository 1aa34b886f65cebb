//! HTTP backend for OpenAI-compatible APIs.
//!
//! Speaks `POST {base}/responses` for structured responses and
//! `POST {base}/chat/completions` for chat completions. Servers that only
//! implement chat completions are used with [`ApiMode::Chat`], which makes the
//! capability probe report the structured shape as absent.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{Backend, ChatRequest, ResponsesRequest, StructuredResponses};
use crate::{Error, Result};

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest backend error body kept in [`Error::Backend`].
const MAX_ERROR_BODY: usize = 500;

/// Which call shapes the backend advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiMode {
    /// Structured responses, with chat completion as the fallback shape.
    #[default]
    Responses,
    /// Chat completion only.
    Chat,
}

impl ApiMode {
    /// Name as accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Responses => "responses",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "responses" => Ok(Self::Responses),
            "chat" => Ok(Self::Chat),
            other => Err(format!("unknown api mode '{other}' (expected responses or chat)")),
        }
    }
}

/// Connection settings for [`OpenAiClient`].
#[derive(Clone)]
pub struct BackendSettings {
    /// Bearer token.
    pub api_key: String,
    /// Base URL without trailing endpoint, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Advertised call shapes.
    pub api_mode: ApiMode,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_mode", &self.api_mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// OpenAI-compatible HTTP client.
pub struct OpenAiClient {
    client: Client,
    settings: BackendSettings,
}

impl OpenAiClient {
    /// Build a client. No request is made.
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("specdoc/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.base_url.trim_end_matches('/'))
    }

    #[instrument(level = "debug", skip(self, body))]
    async fn post_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<Value> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend {
                status: status.as_u16(),
                message: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!(%url, bytes = bytes.len(), "Received backend response");
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(format!(
                "backend did not answer within {}s",
                self.settings.timeout.as_secs()
            ))
        } else {
            Error::Network(err)
        }
    }
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl StructuredResponses for OpenAiClient {
    async fn create_response(&self, request: &ResponsesRequest) -> Result<Value> {
        self.post_json("responses", request).await
    }
}

#[async_trait::async_trait]
impl Backend for OpenAiClient {
    fn probe_structured(&self) -> Result<Option<&dyn StructuredResponses>> {
        Ok(match self.settings.api_mode {
            ApiMode::Responses => Some(self),
            ApiMode::Chat => None,
        })
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<Value> {
        self.post_json("chat/completions", request).await
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings(mode: ApiMode) -> BackendSettings {
        BackendSettings {
            api_key: "sk-secret".to_string(),
            base_url: "http://localhost:9/v1/".to_string(),
            api_mode: mode,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_api_mode_parsing() {
        assert_eq!("responses".parse::<ApiMode>().unwrap(), ApiMode::Responses);
        assert_eq!(" CHAT ".parse::<ApiMode>().unwrap(), ApiMode::Chat);
        assert!("completions".parse::<ApiMode>().is_err());
        assert_eq!(ApiMode::default().to_string(), "responses");
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = OpenAiClient::new(settings(ApiMode::Chat)).unwrap();
        assert_eq!(
            client.endpoint("chat/completions"),
            "http://localhost:9/v1/chat/completions"
        );
    }

    #[test]
    fn test_probe_follows_api_mode() {
        let responses = OpenAiClient::new(settings(ApiMode::Responses)).unwrap();
        let chat = OpenAiClient::new(settings(ApiMode::Chat)).unwrap();

        assert!(responses.probe_structured().unwrap().is_some());
        assert!(chat.probe_structured().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", settings(ApiMode::Chat));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é…");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}

//! Backend invocation for text generation.
//!
//! Backends speak one or both of two request shapes:
//!
//! - **Structured response**: `{ model, input, reasoning }`. The answer is a
//!   list of output items; reasoning-capable models put a distinct final
//!   message after their reasoning item, so the text is looked up at
//!   `output[1]` first and at `output[0]` only when the later slot is absent.
//! - **Chat completion**: `{ model, messages }` with the answer at
//!   `choices[0].message.content`.
//!
//! [`Invoker`] probes the backend for the structured capability on every
//! call and falls back to chat completion when the probe says no or fails.
//!
//! ## Key Components
//!
//! - [`Backend`]: capability probe plus the chat-completion call
//! - [`StructuredResponses`]: the optional structured-response call
//! - [`Protocol`]: per-shape text extraction
//! - [`Invoker`]: builds the two messages and dispatches a batch
//! - [`openai::OpenAiClient`]: HTTP implementation of both shapes

pub mod openai;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::Result;
use crate::batch::Batch;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction message.
    System,
    /// Content message.
    User,
}

/// One request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Reasoning options for structured responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningOptions {
    /// Effort hint, e.g. `low`.
    pub effort: String,
}

/// Structured-response request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier.
    pub model: String,
    /// System message followed by user message.
    pub input: Vec<Message>,
    /// Reasoning options.
    pub reasoning: ReasoningOptions,
}

/// Chat-completion request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System message followed by user message.
    pub messages: Vec<Message>,
}

/// The optional structured-response capability.
#[async_trait::async_trait]
pub trait StructuredResponses: Send + Sync {
    /// Submit a structured-response request and return the raw result.
    async fn create_response(&self, request: &ResponsesRequest) -> Result<Value>;
}

/// A text-generation backend.
///
/// Implement this trait to plug in other transports; tests use in-memory
/// implementations.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Return the structured-response capability if this backend has one.
    ///
    /// Errors are treated by callers exactly like `Ok(None)`.
    fn probe_structured(&self) -> Result<Option<&dyn StructuredResponses>>;

    /// Submit a chat-completion request and return the raw result.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<Value>;
}

/// Remote call shape used for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// `input` + `reasoning` request, output-item result.
    StructuredResponse,
    /// `messages` request, choices result.
    ChatCompletion,
}

impl Protocol {
    /// Pull the generated text out of a raw result.
    ///
    /// Missing text yields an empty string, which callers treat as
    /// "nothing to record".
    #[must_use]
    pub fn extract_text(self, raw: &Value) -> String {
        let text = match self {
            Self::StructuredResponse => text_at(raw, "/output/1/content/0/text")
                .or_else(|| text_at(raw, "/output/0/content/0/text")),
            Self::ChatCompletion => text_at(raw, "/choices/0/message/content"),
        };
        text.unwrap_or_default().to_string()
    }

    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StructuredResponse => "structured-response",
            Self::ChatCompletion => "chat-completion",
        }
    }
}

fn text_at<'a>(raw: &'a Value, pointer: &str) -> Option<&'a str> {
    raw.pointer(pointer).and_then(Value::as_str)
}

fn probe<B: Backend + ?Sized>(backend: &B) -> Option<&dyn StructuredResponses> {
    match backend.probe_structured() {
        Ok(capability) => capability,
        Err(err) => {
            debug!(error = %err, "Structured-response probe failed; using chat completion");
            None
        },
    }
}

/// Sends batches to a backend with a fixed system prompt.
pub struct Invoker<B: Backend> {
    backend: B,
    system_prompt: String,
    model: String,
    reasoning_effort: String,
}

impl<B: Backend> Invoker<B> {
    /// Create an invoker.
    pub fn new(
        backend: B,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
        reasoning_effort: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            model: model.into(),
            reasoning_effort: reasoning_effort.into(),
        }
    }

    /// The two messages for a batch: system prompt first, then the batch.
    #[must_use]
    pub fn messages(&self, batch: &Batch) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt.clone()),
            Message::user(batch.user_content()),
        ]
    }

    /// Generate text for one batch.
    ///
    /// Returns an empty string when the backend produced nothing. Errors from
    /// the remote call are returned unchanged.
    #[instrument(level = "debug", skip(self, batch), fields(files = batch.len(), chars = batch.char_count()))]
    pub async fn invoke(&self, batch: &Batch) -> Result<String> {
        let messages = self.messages(batch);

        let (protocol, raw) = if let Some(structured) = probe(&self.backend) {
            let request = ResponsesRequest {
                model: self.model.clone(),
                input: messages,
                reasoning: ReasoningOptions {
                    effort: self.reasoning_effort.clone(),
                },
            };
            (
                Protocol::StructuredResponse,
                structured.create_response(&request).await?,
            )
        } else {
            let request = ChatRequest {
                model: self.model.clone(),
                messages,
            };
            (
                Protocol::ChatCompletion,
                self.backend.chat_completion(&request).await?,
            )
        };

        let text = protocol.extract_text(&raw);
        debug!(
            protocol = protocol.as_str(),
            chars = text.len(),
            "Backend call completed"
        );
        Ok(text)
    }

    /// Borrow the backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> std::fmt::Debug for Invoker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("model", &self.model)
            .field("reasoning_effort", &self.reasoning_effort)
            .finish_non_exhaustive()
    }
}

//! # SMS Core
//!
//! Core traits and types for the phone-ai SMS to LLM bridge.
//!
//! This crate provides the fundamental building blocks shared by every other crate:
//! - [`CompletionClient`] trait for asking a language model for a reply
//! - [`ConversationStore`] trait for per-sender message history
//! - Common types for inbound messages, completion requests, responses, and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{CompletionClient, CompletionRequest, Message};
//!
//! let history = vec![Message::user("Hello")];
//! let response = client.complete(CompletionRequest {
//!     model: "claude-sonnet-4-20250514",
//!     max_tokens: 500,
//!     system: "Be brief.",
//!     messages: &history,
//! }).await?;
//! ```

pub mod store;

pub use store::{ConversationStore, InMemoryConversationStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur while requesting a completion
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Completion provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
    /// Provider answered with a body we could not use
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Unexpected error occurred
    #[error("unexpected: {0}")]
    Unexpected(String),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    NoContent = 204,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a sender's conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Normalized inbound SMS.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    pub to: Option<String>,
    pub text: String,
    pub provider: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: &'a [Message],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Text of the first content block.
    pub text: String,
    /// Model that actually served the request, as reported by the provider.
    pub model: Option<String>,
    pub stop_reason: Option<String>,
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    pub fn ok(body: String, content_type: &str) -> Self {
        Self {
            status: HttpStatus::Ok,
            body,
            content_type: content_type.to_string(),
        }
    }

    /// Empty acknowledgement: the provider sees a success and sends nothing back.
    pub fn no_content() -> Self {
        Self {
            status: HttpStatus::NoContent,
            body: String::new(),
            content_type: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask the model for the next assistant turn of `request.messages`.
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

//! # Phone AI
//!
//! Text with an LLM over SMS. Twilio posts each inbound message to `POST /sms`;
//! the message joins the sender's conversation, the whole conversation goes to
//! the Anthropic Messages API, and the reply comes back as TwiML.
//!
//! ## Features
//!
//! - **Per-sender history**: last 20 messages kept in memory, reset with `reset`, `clear` or `new chat`
//! - **Allowlist**: optionally answer only one phone number, silently dropping everyone else
//! - **Ordered turns**: messages from the same sender are answered one at a time
//! - **Graceful failures**: API errors become an apology SMS instead of an HTTP error
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phone_ai::{build_router, config::AppConfig};
//!
//! let config = AppConfig::load()?;
//! let app = build_router(&config)?;
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod telemetry;

use config::AppConfig;
use llm_anthropic::AnthropicClient;
use sms_core::{CompletionError, InMemoryConversationStore};
use sms_web_axum::{AppState, router};
use sms_web_generic::WebhookProcessor;
use std::sync::Arc;
use std::time::Duration;

/// Completion client described by `config.anthropic`.
pub fn anthropic_client(config: &AppConfig) -> Result<AnthropicClient, CompletionError> {
    let settings = &config.anthropic;
    let client = AnthropicClient::with_base_url(
        settings.api_key.clone().unwrap_or_default(),
        settings.base_url.clone(),
    )
    .with_api_version(settings.api_version.clone());
    match settings.request_timeout_seconds {
        Some(secs) => client.with_timeout(Duration::from_secs(secs)),
        None => Ok(client),
    }
}

/// Wire the Anthropic client and an in-memory store into the HTTP routes.
pub fn build_router(config: &AppConfig) -> Result<axum::Router, CompletionError> {
    let processor = WebhookProcessor::new(
        Arc::new(anthropic_client(config)?),
        Arc::new(InMemoryConversationStore::new()),
        config.chat_settings(),
    );
    Ok(router(AppState { processor }))
}

/// Common imports for Phone AI usage
pub mod prelude {
    pub use crate::config::{
        AnthropicConfig, AppConfig, ConversationConfig, LoggingConfig, SecurityConfig,
        ServerConfig,
    };
    pub use sms_core::*;
    pub use sms_web_generic::{ChatSettings, TurnOutcome, WebhookProcessor};
}

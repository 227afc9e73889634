//! Framework-agnostic handling of one inbound SMS: allowlist, reset commands,
//! the completion call and history bookkeeping. Framework adapters only have to
//! decode the request into an [`InboundMessage`] and convert the resulting
//! [`WebhookResponse`].

mod locks;

pub use locks::{SenderGuard, SenderLocks};

use sms_core::{
    CompletionClient, CompletionError, CompletionRequest, ConversationStore, InboundMessage,
    Message, WebhookResponse,
};
use sms_twilio::{MessagingResponse, TWIML_CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant responding via SMS text messages.
Keep your responses concise and suitable for text messaging - aim for under 160 characters when possible,
but you can go longer if necessary to properly answer the question. Be friendly and conversational.";

/// Lowercased message bodies that wipe the sender's history.
pub const RESET_COMMANDS: [&str; 3] = ["reset", "clear", "new chat"];
pub const RESET_REPLY: &str = "Conversation cleared! Send me a message to start fresh.";
pub const ERROR_REPLY_PREFIX: &str = "Sorry, I encountered an error: ";
/// Characters of the error description included in the fallback reply.
pub const ERROR_DETAIL_CHARS: usize = 100;

/// Knobs for a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Maximum stored messages per sender.
    pub history_limit: usize,
    /// When set, only this sender gets replies.
    pub allowed_sender: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: SYSTEM_PROMPT.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            allowed_sender: None,
        }
    }
}

impl ChatSettings {
    /// Restrict replies to `sender`. Blank values disable the allowlist.
    pub fn with_allowed_sender(mut self, sender: Option<String>) -> Self {
        self.allowed_sender = sender.filter(|s| !s.trim().is_empty());
        self
    }

    fn admits(&self, sender: &str) -> bool {
        self.allowed_sender
            .as_deref()
            .map_or(true, |allowed| allowed == sender)
    }
}

/// What happened to one inbound message.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Sender is not on the allowlist; nothing was stored or sent.
    Rejected,
    /// History was wiped by a reset command.
    Cleared { reply: String },
    /// The model answered and both sides of the turn were recorded.
    Answered { reply: String },
    /// The completion call failed; only the user message was recorded.
    Failed {
        reply: String,
        error: CompletionError,
    },
}

impl TurnOutcome {
    /// Text to send back to the sender, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            TurnOutcome::Rejected => None,
            TurnOutcome::Cleared { reply }
            | TurnOutcome::Answered { reply }
            | TurnOutcome::Failed { reply, .. } => Some(reply),
        }
    }
}

pub fn is_reset_command(text: &str) -> bool {
    let lowered = text.to_lowercase();
    RESET_COMMANDS.contains(&lowered.as_str())
}

/// Reply sent when the completion call fails.
pub fn error_reply(error: &CompletionError) -> String {
    let detail: String = error.to_string().chars().take(ERROR_DETAIL_CHARS).collect();
    format!("{ERROR_REPLY_PREFIX}{detail}")
}

/// Framework-agnostic webhook processor that handles the core SMS logic
#[derive(Clone)]
pub struct WebhookProcessor {
    completion: Arc<dyn CompletionClient>,
    store: Arc<dyn ConversationStore>,
    locks: SenderLocks,
    settings: Arc<ChatSettings>,
}

impl WebhookProcessor {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn ConversationStore>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            completion,
            store,
            locks: SenderLocks::new(),
            settings: Arc::new(settings),
        }
    }

    /// Process an inbound SMS and return a framework-agnostic response
    pub async fn process_webhook(&self, inbound: &InboundMessage) -> WebhookResponse {
        match self.process_message(inbound).await.reply() {
            None => WebhookResponse::no_content(),
            Some(reply) => {
                let twiml = MessagingResponse::new().message(reply).to_xml();
                debug!(sid = %inbound.id, %twiml, "TwiML response");
                WebhookResponse::ok(twiml, TWIML_CONTENT_TYPE)
            }
        }
    }

    pub async fn process_message(&self, inbound: &InboundMessage) -> TurnOutcome {
        let text = inbound.text.trim().to_string();
        let sender = inbound.from.clone();
        info!(
            sid = %inbound.id,
            provider = inbound.provider,
            %sender,
            to = ?inbound.to,
            message = %text,
            "received SMS"
        );

        if !self.settings.admits(&sender) {
            warn!(%sender, "rejected SMS from sender outside the allowlist");
            return TurnOutcome::Rejected;
        }

        // Detached: the turn finishes and applies the history cap even if the
        // caller stops waiting.
        let turn = tokio::spawn(self.clone().run_turn(sender, text));
        match turn.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let err = CompletionError::Unexpected(join_err.to_string());
                error!(error = %err, "conversation turn aborted");
                TurnOutcome::Failed {
                    reply: error_reply(&err),
                    error: err,
                }
            }
        }
    }

    async fn run_turn(self, sender: String, text: String) -> TurnOutcome {
        // Held for the whole turn so a sender's messages are answered in order
        // against the history left by the previous one.
        let _turn = self.locks.acquire(&sender).await;

        if is_reset_command(&text) {
            self.store.clear(&sender).await;
            info!(%sender, "conversation cleared");
            return TurnOutcome::Cleared {
                reply: RESET_REPLY.to_string(),
            };
        }

        self.store.append(&sender, Message::user(text), None).await;
        let history = self.store.history(&sender).await;
        info!(%sender, messages = history.len(), model = %self.settings.model, "calling completion API");

        let request = CompletionRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system: &self.settings.system_prompt,
            messages: &history,
        };
        let limit = self.settings.history_limit;
        match self.completion.complete(request).await {
            Ok(response) => {
                info!(
                    %sender,
                    reply = %response.text,
                    served_by = ?response.model,
                    stop_reason = ?response.stop_reason,
                    "assistant reply"
                );
                self.store
                    .append(&sender, Message::assistant(response.text.clone()), Some(limit))
                    .await;
                TurnOutcome::Answered {
                    reply: response.text,
                }
            }
            Err(err) => {
                error!(%sender, error = %err, "completion request failed");
                self.store.truncate(&sender, limit).await;
                TurnOutcome::Failed {
                    reply: error_reply(&err),
                    error: err,
                }
            }
        }
    }
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}

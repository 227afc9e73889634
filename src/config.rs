use config::{Config, ConfigError, Environment, File};
use llm_anthropic::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use sms_web_generic::{
    ChatSettings, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, SYSTEM_PROMPT,
};
use std::env;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Completion provider configuration
    pub anthropic: AnthropicConfig,
    /// Conversation behaviour
    pub conversation: ConversationConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8000)
    pub port: u16,
}

/// Anthropic Messages API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnthropicConfig {
    /// API key; also read from `ANTHROPIC_API_KEY`
    pub api_key: Option<String>,
    /// API base URL (default: https://api.anthropic.com)
    pub base_url: String,
    /// `anthropic-version` header (default: 2023-06-01)
    pub api_version: String,
    /// Model id (default: claude-sonnet-4-20250514)
    pub model: String,
    /// Reply token bound (default: 500)
    pub max_tokens: u32,
    /// Per-call timeout in seconds; unset keeps the HTTP client's default
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationConfig {
    /// Stored messages per sender (default: 20)
    pub history_limit: usize,
    pub system_prompt: String,
}

/// Security configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SecurityConfig {
    /// Only this sender gets replies; also read from `ALLOWED_PHONE_NUMBER`
    pub allowed_sender: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout_seconds: None,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with PHONE_AI__)
            .add_source(Environment::with_prefix("PHONE_AI").separator("__"))
            // Conventional unprefixed variables win over everything else
            .set_override_option("anthropic.api_key", non_empty_var("ANTHROPIC_API_KEY"))?
            .set_override_option(
                "security.allowed_sender",
                non_empty_var("ALLOWED_PHONE_NUMBER"),
            )?
            .build()?;

        s.try_deserialize()
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.anthropic.model.clone(),
            max_tokens: self.anthropic.max_tokens,
            system_prompt: self.conversation.system_prompt.clone(),
            history_limit: self.conversation.history_limit,
            allowed_sender: None,
        }
        .with_allowed_sender(self.security.allowed_sender.clone())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            anthropic: AnthropicConfig::default(),
            conversation: ConversationConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");

        let settings = config.chat_settings();
        assert_eq!(settings, ChatSettings::default());
        assert_eq!(settings.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.max_tokens, 500);
        assert_eq!(settings.history_limit, 20);
    }

    #[test]
    fn empty_allowed_sender_means_no_allowlist() {
        let mut config = AppConfig::default();
        config.security.allowed_sender = Some(String::new());
        assert!(config.chat_settings().allowed_sender.is_none());

        config.security.allowed_sender = Some("+15550001".into());
        assert_eq!(
            config.chat_settings().allowed_sender.as_deref(),
            Some("+15550001")
        );
    }

    #[test]
    fn defaults_survive_config_round_trip() {
        let built = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).unwrap())
            .set_override("server.port", 9000)
            .unwrap()
            .build()
            .unwrap();
        let config: AppConfig = built.try_deserialize().unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.anthropic.api_key.is_none());
        assert_eq!(config.conversation.system_prompt, SYSTEM_PROMPT);
    }
}

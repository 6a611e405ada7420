//! # Configuration Module
//!
//! Typed configuration for the bot, the Wikipedia provider, the session store
//! and the renderer. Every struct has sensible defaults; `BotConfig::from_env`
//! applies environment overrides on top of them.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_USER_AGENT: &str = "wikichat/0.1 (Telegram Wikipedia reader)";
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
/// Telegram accepts 4096 characters per message; keep headroom for entities.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Recovery configuration for provider calls
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a whole provider operation in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 5000,
            operation_timeout_secs: 60,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

/// Wikipedia and translation client settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub user_agent: String,
    /// Number of titles returned per search
    pub search_limit: u32,
    pub translate_endpoint: String,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum characters sent to the translator in one request
    pub translate_chunk_chars: usize,
    /// Chunks translated in parallel
    pub translate_concurrency: usize,
    /// Where exported documents are written; system temp dir when `None`
    pub document_dir: Option<PathBuf>,
    pub recovery: RecoveryConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            request_timeout_secs: 15,
            translate_chunk_chars: 800,
            translate_concurrency: 8,
            document_dir: None,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Session store housekeeping
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted
    pub idle_ttl_minutes: i64,
    /// How often the sweeper runs
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: 24 * 60,
            sweep_interval_secs: 15 * 60,
        }
    }
}

/// Limits applied by the screen renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Transport payload limit in characters
    pub max_message_chars: usize,
    /// Summary length on the article screen
    pub summary_chars: usize,
    /// Button label length
    pub button_label_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_message_chars: MAX_MESSAGE_CHARS,
            summary_chars: 1000,
            button_label_chars: 40,
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub provider: ProviderConfig,
    pub session: SessionConfig,
    pub render: RenderConfig,
}

impl BotConfig {
    /// Build the configuration from environment variables.
    ///
    /// `TELEGRAM_BOT_TOKEN` is required, every other variable is optional.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

        let mut provider = ProviderConfig::default();
        if let Ok(agent) = env::var("WIKI_USER_AGENT") {
            provider.user_agent = agent;
        }
        if let Ok(endpoint) = env::var("TRANSLATE_ENDPOINT") {
            provider.translate_endpoint = endpoint;
        }
        override_from_env("WIKI_SEARCH_LIMIT", &mut provider.search_limit)?;
        override_from_env("PROVIDER_TIMEOUT_SECS", &mut provider.request_timeout_secs)?;
        override_from_env("PROVIDER_MAX_RETRIES", &mut provider.recovery.max_retries)?;
        if let Ok(dir) = env::var("DOCUMENT_DIR") {
            provider.document_dir = Some(PathBuf::from(dir));
        }

        let mut session = SessionConfig::default();
        override_from_env("SESSION_IDLE_MINUTES", &mut session.idle_ttl_minutes)?;
        override_from_env("SESSION_SWEEP_SECS", &mut session.sweep_interval_secs)?;

        let mut render = RenderConfig::default();
        override_from_env("MAX_MESSAGE_CHARS", &mut render.max_message_chars)?;

        Ok(Self {
            telegram_token,
            provider,
            session,
            render,
        })
    }
}

fn override_from_env<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = env::var(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let provider = ProviderConfig::default();
        assert!(provider.search_limit > 0);
        assert!(provider.translate_chunk_chars >= 200);
        assert!(provider.recovery.max_retries <= 10);
        assert!(provider.recovery.base_retry_delay_ms <= provider.recovery.max_retry_delay_ms);

        let render = RenderConfig::default();
        assert!(render.max_message_chars <= 4096);
        assert!(render.summary_chars < render.max_message_chars);
    }

    #[test]
    fn test_override_from_env_parses_value() {
        std::env::set_var("WIKICHAT_TEST_LIMIT", " 25 ");
        let mut limit: u32 = 10;
        override_from_env("WIKICHAT_TEST_LIMIT", &mut limit).unwrap();
        assert_eq!(limit, 25);

        std::env::set_var("WIKICHAT_TEST_LIMIT", "many");
        assert!(override_from_env("WIKICHAT_TEST_LIMIT", &mut limit).is_err());
        assert_eq!(limit, 25);
        std::env::remove_var("WIKICHAT_TEST_LIMIT");
    }
}

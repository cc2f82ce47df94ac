//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the front end runs with.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::DEFAULT_BASE_URL;
use crate::types::{ConversationRef, DEFAULT_MODEL};

/// Default connect timeout, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the cvbot-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Server base URL.
    #[arrrg(optional, "Server base URL (default: http://localhost:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: openai/gpt-4o-mini)", "MODEL")]
    pub model: Option<String>,

    /// Conversation to open.
    #[arrrg(optional, "Conversation id to open", "ID")]
    pub conversation: Option<i64>,

    /// Candidate to start a new conversation about when no conversation is given.
    #[arrrg(optional, "Start a new conversation about this candidate", "CANDIDATE")]
    pub candidate: Option<String>,

    /// Connect timeout.
    #[arrrg(optional, "Connect timeout in seconds (default: 60)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Server base URL.
    pub base_url: String,

    /// Model sent with each request.
    pub model: String,

    /// Conversation to open on start.
    pub conversation: ConversationRef,

    /// Candidate for a conversation created on start.
    pub candidate: Option<String>,

    /// Connect timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: http://localhost:8000/
    /// - Model: openai/gpt-4o-mini
    /// - Conversation: unbound
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            conversation: ConversationRef::unbound(),
            candidate: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_color: true,
        }
    }

    /// Sets the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the conversation to open.
    pub fn with_conversation(mut self, conversation: ConversationRef) -> Self {
        self.conversation = conversation;
        self
    }

    /// Sets the candidate for a conversation created on start.
    pub fn with_candidate(mut self, candidate: Option<String>) -> Self {
        self.candidate = candidate;
        self
    }

    /// Sets the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            base_url: args.base_url.unwrap_or(defaults.base_url),
            model: args.model.unwrap_or(defaults.model),
            conversation: args
                .conversation
                .map(ConversationRef::bound)
                .unwrap_or(defaults.conversation),
            candidate: args.candidate,
            timeout: args
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.base_url, "http://localhost:8000/");
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.conversation.id(), None);
        assert!(config.candidate.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://cvbot.internal:9000".to_string()),
            model: Some("anthropic/claude-3.5-haiku".to_string()),
            conversation: Some(17),
            candidate: Some("cand-3".to_string()),
            timeout_secs: Some(5),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url, "http://cvbot.internal:9000");
        assert_eq!(config.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.conversation.id(), Some(17));
        assert_eq!(config.candidate.as_deref(), Some("cand-3"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://example.com/")
            .with_model("openai/gpt-4o")
            .with_conversation(ConversationRef::bound(3))
            .with_candidate(Some("cand-1".to_string()))
            .with_timeout(Duration::from_secs(10))
            .without_color();
        assert_eq!(config.base_url, "http://example.com/");
        assert_eq!(config.model, "openai/gpt-4o");
        assert_eq!(config.conversation.id(), Some(3));
        assert_eq!(config.candidate.as_deref(), Some("cand-1"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.use_color);
    }
}

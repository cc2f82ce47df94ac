use serde::{Deserialize, Serialize};

use crate::types::UsageSnapshot;

/// An event carried on a `data:` line of a chat response stream.
///
/// The server emits one `user_message` event first (for chat and edit
/// requests), then `token` events as the assistant writes, then at most one
/// `usage` event.  Event types this client does not understand decode to
/// [`ChatEvent::Other`] and are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// The server persisted the user's message and assigned it an id.
    #[serde(rename = "user_message")]
    UserMessage {
        /// The server-side id of the user's message.
        message_id: i64,
    },

    /// A fragment of the assistant's response text.
    #[serde(rename = "token")]
    Token {
        /// The text fragment, in arrival order.
        content: String,
    },

    /// A fresh usage snapshot for the current day.
    #[serde(rename = "usage")]
    Usage(UsageSnapshot),

    /// An event type this client does not consume.
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn chat_event_user_message() {
        let event: ChatEvent =
            from_value(json!({"type": "user_message", "message_id": 42})).unwrap();
        assert_eq!(event, ChatEvent::UserMessage { message_id: 42 });
    }

    #[test]
    fn chat_event_token() {
        let event: ChatEvent = from_value(json!({"type": "token", "content": "Hel"})).unwrap();
        assert_eq!(
            event,
            ChatEvent::Token {
                content: "Hel".to_string()
            }
        );
    }

    #[test]
    fn chat_event_usage() {
        let event: ChatEvent = from_value(json!({
            "type": "usage",
            "input_tokens": 10,
            "output_tokens": 20,
            "daily_total_usd": 0.5,
            "daily_limit_usd": 1.0
        }))
        .unwrap();
        assert_eq!(
            event,
            ChatEvent::Usage(UsageSnapshot::new(10, 20, 0.5, 1.0))
        );
    }

    #[test]
    fn chat_event_unknown_type() {
        let event: ChatEvent = from_value(json!({"type": "heartbeat"})).unwrap();
        assert_eq!(event, ChatEvent::Other);
    }

    #[test]
    fn chat_event_non_numeric_message_id_is_rejected() {
        let result =
            from_value::<ChatEvent>(json!({"type": "user_message", "message_id": "seven"}));
        assert!(result.is_err());
    }
}

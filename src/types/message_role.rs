use std::fmt;

use serde::{Deserialize, Serialize};

/// The author of a message in a conversation transcript.
///
/// The server also stores `system` rows, but they are never sent to the
/// browser-side transcript, so the client only knows these two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// A message written by the person chatting.
    User,
    /// A message produced by the assistant.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

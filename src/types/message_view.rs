use crate::types::MessageRole;

/// Identifies one message view in a transcript for the lifetime of a page view.
///
/// View ids are assigned locally and never reused; they exist before the
/// server assigns a message id and survive edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// What a view shows: rendered markup or literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Sanitized HTML produced by a markdown renderer.
    Html(String),
    /// Plain text to be shown verbatim.
    Text(String),
}

impl MessageContent {
    /// Returns the underlying string regardless of kind.
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Html(s) | MessageContent::Text(s) => s,
        }
    }
}

/// One rendered message in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    /// Local identity of the view.
    pub view_id: ViewId,
    /// Who wrote the message.
    pub role: MessageRole,
    /// Server-assigned id; unset for a user message until the stream echoes it.
    pub message_id: Option<i64>,
    /// The source text of the message (markdown for assistant messages).
    pub display_text: String,
    /// What the view currently shows.
    pub content: MessageContent,
    /// Whether the message may be revised and resent.
    pub editable: bool,
    /// Whether the view carries the "still streaming" marker.
    pub pending: bool,
}

impl MessageView {
    /// Returns true if this is a user message.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_as_str() {
        assert_eq!(MessageContent::Html("<p>x</p>".into()).as_str(), "<p>x</p>");
        assert_eq!(MessageContent::Text("x".into()).as_str(), "x");
    }
}

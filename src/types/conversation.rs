use serde::{Deserialize, Serialize};

/// A conversation thread as returned by `/api/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Server-assigned conversation id.
    pub id: i64,
    /// The candidate this conversation is about.
    pub candidate_id: String,
    /// Thread title shown in the sidebar.
    #[serde(default)]
    pub title: Option<String>,
    /// Display name of the candidate, present on list responses.
    #[serde(default)]
    pub candidate_name: Option<String>,
    /// Creation timestamp as stored by the server.
    #[serde(default)]
    pub created_at: String,
    /// Last-activity timestamp as stored by the server.
    #[serde(default)]
    pub updated_at: String,
}

/// Body of `POST /api/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationCreate {
    /// The candidate to start a conversation about.
    pub candidate_id: String,
}

/// The conversation a chat view is bound to.
///
/// Bound once when the view is created and never changed afterwards.  An
/// unbound reference makes every send a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationRef {
    id: Option<i64>,
}

impl ConversationRef {
    /// A reference bound to `id`.
    pub fn bound(id: i64) -> Self {
        Self { id: Some(id) }
    }

    /// A reference bound to no conversation.
    pub fn unbound() -> Self {
        Self { id: None }
    }

    /// Binds from a page route of the form `/chat/{id}`.
    ///
    /// Any other route, including `/chat` itself, yields an unbound reference.
    pub fn from_route(path: &str) -> Self {
        let id = path
            .strip_prefix("/chat/")
            .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|rest| rest.parse::<i64>().ok());
        Self { id }
    }

    /// Returns the bound conversation id, if any.
    pub fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Returns the conversations whose title contains `query`, ignoring case.
///
/// Untitled conversations match only the empty query.
pub fn filter_conversations<'a>(
    conversations: &'a [Conversation],
    query: &str,
) -> Vec<&'a Conversation> {
    let query = query.to_lowercase();
    conversations
        .iter()
        .filter(|c| {
            c.title
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    fn conversation(id: i64, title: Option<&str>) -> Conversation {
        Conversation {
            id,
            candidate_id: "jdoe".to_string(),
            title: title.map(str::to_string),
            candidate_name: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn route_binding() {
        assert_eq!(ConversationRef::from_route("/chat/17").id(), Some(17));
        assert_eq!(ConversationRef::from_route("/chat").id(), None);
        assert_eq!(ConversationRef::from_route("/chat/").id(), None);
        assert_eq!(ConversationRef::from_route("/chat/17/edit").id(), None);
        assert_eq!(ConversationRef::from_route("/chat/-3").id(), None);
        assert_eq!(ConversationRef::from_route("/costs").id(), None);
    }

    #[test]
    fn conversation_list_row() {
        let conv: Conversation = from_value(json!({
            "id": 3,
            "candidate_id": "jdoe",
            "title": "New Chat",
            "created_at": "2026-10-19 08:00:00",
            "updated_at": "2026-10-19 09:30:00",
            "candidate_name": "Jane Doe"
        }))
        .unwrap();
        assert_eq!(conv.id, 3);
        assert_eq!(conv.candidate_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let convs = vec![
            conversation(1, Some("Backend role")),
            conversation(2, Some("Frontend ROLE")),
            conversation(3, Some("Salary questions")),
            conversation(4, None),
        ];
        let ids: Vec<i64> = filter_conversations(&convs, "role")
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(filter_conversations(&convs, "").len(), 4);
    }
}

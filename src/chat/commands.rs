//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the session instead of being sent to
//! the server as a message.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Revise an earlier user message and regenerate everything after it.
    Edit {
        /// Server-side id of the user message.
        message_id: i64,
        /// Replacement text.
        text: String,
    },

    /// Change the model used for subsequent requests.
    Model(String),

    /// Refresh and show today's usage.
    Usage,

    /// Start a new conversation about a candidate and switch to it.
    New(String),

    /// Delete the current conversation.
    Delete,

    /// List conversations, optionally filtered by title.
    Threads(Option<String>),

    /// Show daily and monthly spend.
    Costs,

    /// Run a job-fit analysis for a candidate.
    Fit {
        /// Candidate to analyze.
        candidate_id: String,
        /// Job description text.
        job_description: String,
    },

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a regular message.
///
/// # Examples
///
/// ```
/// # use cvbot_chat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("/edit 12 try again").is_some());
/// assert!(parse_command("What did they build at Acme?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let (command, argument) = split_word(rest);
    let command = command.to_lowercase();

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "edit" => parse_edit(argument),
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "usage" => ChatCommand::Usage,
        "new" => match argument {
            Some(candidate) => ChatCommand::New(candidate.to_string()),
            None => ChatCommand::Invalid("/new requires a candidate id".to_string()),
        },
        "delete" => ChatCommand::Delete,
        "threads" => ChatCommand::Threads(argument.map(|s| s.to_string())),
        "costs" => ChatCommand::Costs,
        "fit" => parse_fit(argument),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Split off the first whitespace-delimited word; the remainder is trimmed
/// and `None` when empty.
fn split_word(input: &str) -> (&str, Option<&str>) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => {
            let rest = rest.trim();
            (word, (!rest.is_empty()).then_some(rest))
        }
        None => (input, None),
    }
}

fn parse_edit(argument: Option<&str>) -> ChatCommand {
    let Some(argument) = argument else {
        return ChatCommand::Invalid("/edit requires a message id and new text".to_string());
    };
    let (id, text) = split_word(argument);
    let Ok(message_id) = id.parse::<i64>() else {
        return ChatCommand::Invalid(format!("/edit expects a numeric message id, got {id:?}"));
    };
    match text {
        Some(text) => ChatCommand::Edit {
            message_id,
            text: text.to_string(),
        },
        None => ChatCommand::Invalid("/edit requires new text".to_string()),
    }
}

fn parse_fit(argument: Option<&str>) -> ChatCommand {
    let Some(argument) = argument else {
        return ChatCommand::Invalid("/fit requires a candidate id and a job description".to_string());
    };
    match split_word(argument) {
        (candidate, Some(description)) => ChatCommand::Fit {
            candidate_id: candidate.to_string(),
            job_description: description.to_string(),
        },
        (_, None) => ChatCommand::Invalid("/fit requires a job description".to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /help, /?                 Show this help message
  /quit, /exit, /q          Exit the chat
  /edit <id> <text>         Revise message <id> and regenerate the replies after it
  /model <name>             Change the model (e.g. openai/gpt-4o-mini)
  /usage                    Show today's token usage and spend
  /new <candidate>          Start a new conversation about a candidate
  /delete                   Delete the current conversation
  /threads [query]          List conversations, filtered by title
  /costs                    Show daily and monthly spend
  /fit <candidate> <job>    Analyze how a candidate fits a job description

Anything else is sent to the current conversation.
Message ids are shown as [message #id] once the server assigns them."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_edit() {
        assert_eq!(
            parse_command("/edit 42 What about   Go?"),
            Some(ChatCommand::Edit {
                message_id: 42,
                text: "What about   Go?".to_string()
            })
        );
        assert!(matches!(
            parse_command("/edit abc text"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("numeric")
        ));
        assert!(matches!(
            parse_command("/edit 42"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("new text")
        ));
        assert!(matches!(parse_command("/edit"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model anthropic/claude-3.5-haiku"),
            Some(ChatCommand::Model("anthropic/claude-3.5-haiku".to_string()))
        );
        assert!(matches!(parse_command("/model"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn parse_conversation_commands() {
        assert_eq!(
            parse_command("/new cand-7"),
            Some(ChatCommand::New("cand-7".to_string()))
        );
        assert!(matches!(parse_command("/new"), Some(ChatCommand::Invalid(_))));
        assert_eq!(parse_command("/delete"), Some(ChatCommand::Delete));
        assert_eq!(parse_command("/threads"), Some(ChatCommand::Threads(None)));
        assert_eq!(
            parse_command("/threads backend lead"),
            Some(ChatCommand::Threads(Some("backend lead".to_string())))
        );
    }

    #[test]
    fn parse_usage_and_costs() {
        assert_eq!(parse_command("/usage"), Some(ChatCommand::Usage));
        assert_eq!(parse_command("/costs"), Some(ChatCommand::Costs));
    }

    #[test]
    fn parse_fit() {
        assert_eq!(
            parse_command("/fit cand-7 Senior Rust engineer, async networking"),
            Some(ChatCommand::Fit {
                candidate_id: "cand-7".to_string(),
                job_description: "Senior Rust engineer, async networking".to_string()
            })
        );
        assert!(matches!(parse_command("/fit cand-7"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn unknown_command() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("/frobnicate")
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Tell me about their Rust work"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/edit"));
        assert!(help.contains("/threads"));
        assert!(help.contains("/fit"));
    }
}

//! Terminal rendering for the chat application.
//!
//! A terminal cannot redraw a message in place, so [`TerminalView`] writes
//! only what changed: the new suffix of a streaming reply, a note when a
//! message id binds, and a line per edit.  ANSI styling is optional.

use std::collections::HashSet;
use std::io::{self, Stdout, Write};

use crate::chat::view::ChatView;
use crate::types::{MessageRole, MessageView, ViewId};
use crate::usage::UsageDisplay;

/// ANSI escape code for dim text (used for ids and usage).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for edits).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// A [`ChatView`] that prints to a terminal.
pub struct TerminalView<W: Write + Send> {
    out: W,
    use_color: bool,
    streaming: Option<(ViewId, String)>,
    announced: HashSet<ViewId>,
}

impl TerminalView<Stdout> {
    /// Creates a view that prints to stdout.
    pub fn stdout(use_color: bool) -> Self {
        Self::new(io::stdout(), use_color)
    }
}

impl<W: Write + Send> TerminalView<W> {
    /// Creates a view that prints to `out`.
    pub fn new(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            streaming: None,
            announced: HashSet::new(),
        }
    }

    /// Returns the underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Print an informational line.
    pub fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }

    /// Print streamed text as it arrives, with no line break.
    pub fn print_fragment(&mut self, text: &str) {
        let _ = write!(self.out, "{text}");
        self.flush();
    }

    /// Print an error line.
    pub fn print_error(&mut self, error: &str) {
        let line = format!("Error: {error}");
        self.styled_line(ANSI_RED, &line);
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn styled_line(&mut self, style: &str, text: &str) {
        if self.use_color {
            let _ = writeln!(self.out, "{style}{text}{ANSI_RESET}");
        } else {
            let _ = writeln!(self.out, "{text}");
        }
        self.flush();
    }

    fn print_user(&mut self, message: &MessageView) {
        let line = match message.message_id {
            Some(id) => format!("[#{id}] > {}", message.display_text),
            None => format!("> {}", message.display_text),
        };
        if message.message_id.is_some() {
            self.announced.insert(message.view_id);
        }
        self.styled_line(ANSI_CYAN, &line);
    }

    fn print_assistant(&mut self, message: &MessageView) {
        let _ = writeln!(self.out, "{}", message.display_text);
        self.flush();
    }

    fn stream_update(&mut self, message: &MessageView) {
        let Some((view_id, printed)) = self.streaming.as_mut() else {
            return;
        };
        if *view_id != message.view_id {
            return;
        }
        match message.display_text.strip_prefix(printed.as_str()) {
            Some(suffix) => {
                let _ = write!(self.out, "{suffix}");
            }
            None => {
                // The text was replaced rather than extended.
                let _ = write!(self.out, "\n{}", message.display_text);
            }
        }
        *printed = message.display_text.clone();
        if !message.pending {
            let _ = writeln!(self.out);
            self.streaming = None;
        }
        self.flush();
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn message_appended(&mut self, message: &MessageView) {
        match message.role {
            MessageRole::User => {
                // Fresh sends were just typed at the prompt; only history is echoed.
                if message.message_id.is_some() {
                    self.print_user(message);
                }
            }
            MessageRole::Assistant if message.pending => {
                self.streaming = Some((message.view_id, String::new()));
            }
            MessageRole::Assistant => self.print_assistant(message),
        }
    }

    fn message_updated(&mut self, message: &MessageView) {
        match message.role {
            MessageRole::Assistant => self.stream_update(message),
            MessageRole::User => {
                if let Some(id) = message.message_id
                    && self.announced.insert(message.view_id)
                {
                    let line = format!("[message #{id}]");
                    self.styled_line(ANSI_DIM, &line);
                } else if let Some(id) = message.message_id {
                    let line = format!("[#{id} edited] > {}", message.display_text);
                    self.styled_line(ANSI_YELLOW, &line);
                }
            }
        }
    }

    fn message_removed(&mut self, view_id: ViewId) {
        if self
            .streaming
            .as_ref()
            .is_some_and(|(streaming, _)| *streaming == view_id)
        {
            let _ = writeln!(self.out);
            self.streaming = None;
            self.flush();
        }
        self.announced.remove(&view_id);
    }

    fn messages_restored(&mut self, _after: ViewId, messages: &[MessageView]) {
        if !messages.is_empty() {
            let line = format!("[restored {} later messages]", messages.len());
            self.styled_line(ANSI_DIM, &line);
        }
    }

    fn edit_started(&mut self, message: &MessageView) {
        let line = format!(
            "[editing #{}] {}",
            message.message_id.unwrap_or_default(),
            message.display_text
        );
        self.styled_line(ANSI_YELLOW, &line);
    }

    fn edit_ended(&mut self, message: &MessageView) {
        let line = format!(
            "[edit of #{} closed]",
            message.message_id.unwrap_or_default()
        );
        self.styled_line(ANSI_DIM, &line);
    }

    fn show_usage(&mut self, usage: &UsageDisplay) {
        let line = format!(
            "[{} | {} / {} ({:.0}%)]",
            usage.token_text, usage.current_cost, usage.max_cost, usage.percent
        );
        self.styled_line(ANSI_DIM, &line);
    }

    fn show_error(&mut self, error: &str) {
        self.print_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageContent, UsageSnapshot};

    fn message(view_id: u64, role: MessageRole, text: &str, pending: bool) -> MessageView {
        MessageView {
            view_id: ViewId(view_id),
            role,
            message_id: None,
            display_text: text.to_string(),
            content: MessageContent::Text(text.to_string()),
            editable: false,
            pending,
        }
    }

    fn output(view: &TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.writer().clone()).unwrap()
    }

    #[test]
    fn streaming_prints_suffixes() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.message_appended(&message(1, MessageRole::Assistant, "", true));
        view.message_updated(&message(1, MessageRole::Assistant, "Hel", true));
        view.message_updated(&message(1, MessageRole::Assistant, "Hello", true));
        view.message_updated(&message(1, MessageRole::Assistant, "Hello", false));
        assert_eq!(output(&view), "Hello\n");
    }

    #[test]
    fn replaced_text_starts_new_line() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.message_appended(&message(1, MessageRole::Assistant, "", true));
        view.message_updated(&message(1, MessageRole::Assistant, "partial", true));
        view.message_updated(&message(1, MessageRole::Assistant, "Error: boom", false));
        assert_eq!(output(&view), "partial\nError: boom\n");
    }

    #[test]
    fn bound_id_is_announced_once() {
        let mut view = TerminalView::new(Vec::new(), false);
        let mut user = message(0, MessageRole::User, "hi", false);
        view.message_appended(&user);
        user.message_id = Some(7);
        view.message_updated(&user);
        user.display_text = "hi again".to_string();
        view.message_updated(&user);
        assert_eq!(output(&view), "[message #7]\n[#7 edited] > hi again\n");
    }

    #[test]
    fn fragments_join_on_one_line() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.print_fragment("## Verdict");
        view.print_fragment("\nStrong fit");
        view.print_info("");
        assert_eq!(output(&view), "## Verdict\nStrong fit\n");
    }

    #[test]
    fn usage_line() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.show_usage(&UsageDisplay::new(UsageSnapshot::new(10, 5, 0.5, 2.0)));
        assert_eq!(output(&view), "[10 in / 5 out tokens | $0.50 / $2.00 (25%)]\n");
    }

    #[test]
    fn errors_are_colored() {
        let mut view = TerminalView::new(Vec::new(), true);
        view.show_error("nope");
        assert_eq!(output(&view), format!("{ANSI_RED}Error: nope{ANSI_RESET}\n"));
    }
}

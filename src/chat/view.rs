//! View-update callbacks for the chat session controller.
//!
//! The controller owns the transcript model; a [`ChatView`] mirrors it onto
//! whatever surface the application draws on (a document, a terminal, a test
//! recorder).  Every method is a notification: the view never calls back into
//! the controller.

use crate::types::{MessageView, ViewId};
use crate::usage::UsageDisplay;

/// Receives transcript and composer updates from a chat session controller.
pub trait ChatView: Send {
    /// A message was added at the end of the transcript.
    fn message_appended(&mut self, message: &MessageView);

    /// A message's content, id binding, editability or pending marker changed.
    fn message_updated(&mut self, message: &MessageView);

    /// A message was removed from the transcript.
    fn message_removed(&mut self, view_id: ViewId);

    /// Previously removed messages were put back, in order, directly after `after`.
    fn messages_restored(&mut self, after: ViewId, messages: &[MessageView]) {
        _ = after;
        for message in messages {
            self.message_appended(message);
        }
    }

    /// Inline editing began on `message`; the view should show an editor seeded
    /// with its text.
    fn edit_started(&mut self, message: &MessageView) {
        _ = message;
    }

    /// Inline editing on `message` ended; the view should show its text again.
    fn edit_ended(&mut self, message: &MessageView) {
        _ = message;
    }

    /// The composer became usable (`true`) or unusable (`false`).
    fn set_composer_enabled(&mut self, enabled: bool) {
        _ = enabled;
    }

    /// The composer's text was consumed by a send.
    fn clear_composer(&mut self) {}

    /// Input focus should return to the composer.
    fn focus_composer(&mut self) {}

    /// The newest content should be brought into view.
    fn scroll_to_bottom(&mut self) {}

    /// The usage meter should show `usage`.
    fn show_usage(&mut self, usage: &UsageDisplay) {
        _ = usage;
    }

    /// A failure should be surfaced to the user outside the transcript.
    fn show_error(&mut self, error: &str) {
        _ = error;
    }
}

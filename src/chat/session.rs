//! Core chat session management.
//!
//! This module provides [`ChatSessionController`], which owns one
//! conversation view: the transcript, the composer, the inline edit state and
//! the usage meter.  It sends new and edited user messages, consumes the
//! streamed reply, and keeps exactly one request in flight at a time.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;

use crate::chat::view::ChatView;
use crate::client_logger::ChatLogger;
use crate::observability::{
    CHAT_EDITS, CHAT_FAILURES, CHAT_SENDS, CHAT_SKIPPED, STREAM_DURATION,
};
use crate::render::MarkdownRenderer;
use crate::sse::process_sse;
use crate::transport::{ByteStream, ChatTransport, chat_path, edit_path};
use crate::types::{
    ChatEvent, ChatRequest, ConversationRef, DEFAULT_MODEL, MessageContent, MessageRole,
    MessageView, UsageSnapshot, ViewId,
};
use crate::usage::UsageDisplay;
use crate::{Error, Result};

/// Whether a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Ready to send.
    Idle,
    /// A send or edit is in flight; further sends are rejected.
    Sending,
}

/// What a call to [`ChatSessionController::send_message`] did.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// A precondition was not met; nothing was rendered and nothing was sent.
    Skipped,
    /// The response streamed to completion.
    Completed,
    /// The request failed.  New sends leave an inline error in the transcript;
    /// edits restore the transcript to how it was before the edit.
    Failed(Error),
}

impl SendOutcome {
    /// Returns true if the response streamed to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed)
    }

    /// Returns true if nothing was attempted.
    pub fn is_skipped(&self) -> bool {
        matches!(self, SendOutcome::Skipped)
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SendOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Assistant text received so far for one in-flight request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamAccumulator {
    text: String,
}

impl StreamAccumulator {
    /// Append a token fragment.
    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// The full text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the accumulator, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// A message loaded from the server when the view opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Who wrote the message.
    pub role: MessageRole,
    /// The server-side message id.
    pub message_id: i64,
    /// The stored message text (markdown for assistant messages).
    pub content: String,
}

/// Uncommitted revision of a prior user message.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineEdit {
    message_id: i64,
    view_id: ViewId,
    draft: String,
}

/// Orchestrates one conversation view.
///
/// The controller owns the transcript model and mirrors every change onto
/// its [`ChatView`].  Collaborators are injected: the transport issues
/// requests, the optional renderer turns markdown into HTML (without one,
/// assistant text is shown verbatim), and the optional logger observes
/// traffic.
pub struct ChatSessionController<T: ChatTransport, V: ChatView> {
    conversation: ConversationRef,
    transport: T,
    view: V,
    renderer: Option<Box<dyn MarkdownRenderer>>,
    logger: Option<Arc<dyn ChatLogger>>,
    model: String,
    transcript: Vec<MessageView>,
    next_view_id: u64,
    composer: String,
    composer_enabled: bool,
    state: SendState,
    inline_edit: Option<InlineEdit>,
    resubmit_target: Option<i64>,
    usage: Option<UsageSnapshot>,
}

impl<T: ChatTransport, V: ChatView> ChatSessionController<T, V> {
    /// Creates a controller for `conversation`.
    pub fn new(conversation: ConversationRef, transport: T, view: V) -> Self {
        Self {
            conversation,
            transport,
            view,
            renderer: None,
            logger: None,
            model: DEFAULT_MODEL.to_string(),
            transcript: Vec::new(),
            next_view_id: 0,
            composer: String::new(),
            composer_enabled: true,
            state: SendState::Idle,
            inline_edit: None,
            resubmit_target: None,
            usage: None,
        }
    }

    /// Sets the markdown renderer used for assistant messages.
    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Sets the traffic logger.
    pub fn with_logger(mut self, logger: Arc<dyn ChatLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sets the model sent with each request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Fetches today's usage once and shows it.
    ///
    /// Token counts start at zero until the first streamed usage event.  A
    /// failure leaves the meter untouched.
    pub async fn initialize(&mut self) {
        if let Err(err) = self.refresh_usage().await
            && let Some(logger) = &self.logger
        {
            logger.log_failure(&err);
        }
    }

    /// Re-fetches today's spend and shows it.
    ///
    /// The day-wide figures come from the server; token counts stay those of
    /// the last streamed usage event, or zero before the first one.  On error
    /// the meter is left untouched.
    pub async fn refresh_usage(&mut self) -> Result<()> {
        let today = self.transport.costs_today().await?;
        let snapshot = match self.usage {
            Some(last) => UsageSnapshot {
                input_tokens: last.input_tokens,
                output_tokens: last.output_tokens,
                ..today
            },
            None => today.without_tokens(),
        };
        self.apply_usage(snapshot);
        Ok(())
    }

    /// Seeds the transcript with messages the server already stored.
    pub fn load_history(&mut self, entries: impl IntoIterator<Item = HistoryEntry>) {
        for entry in entries {
            let content = match entry.role {
                MessageRole::User => MessageContent::Text(entry.content.clone()),
                MessageRole::Assistant => self.render_content(&entry.content),
            };
            let view_id = self.allocate_view_id();
            let message = MessageView {
                view_id,
                role: entry.role,
                message_id: Some(entry.message_id),
                display_text: entry.content,
                content,
                editable: entry.role == MessageRole::User,
                pending: false,
            };
            self.view.message_appended(&message);
            self.transcript.push(message);
        }
        self.view.scroll_to_bottom();
    }

    /// Send the composer text, or resend an edit when `text` is given.
    ///
    /// Explicit text is an edit resubmission of the message marked by
    /// [`ChatSessionController::commit_inline_edit`]; with no such mark it is
    /// sent as a new message.  The call is a no-op when the conversation is
    /// unbound, the text is blank after trimming, a request is already in
    /// flight, or the message marked for resubmission is gone.  Whatever happens, the composer is re-enabled and focused
    /// before this returns.
    pub async fn send_message(&mut self, text: Option<&str>) -> SendOutcome {
        if self.state != SendState::Idle {
            CHAT_SKIPPED.click();
            return SendOutcome::Skipped;
        }
        let Some(conversation_id) = self.conversation.id() else {
            CHAT_SKIPPED.click();
            return SendOutcome::Skipped;
        };
        let explicit = text.is_some();
        let text = text.unwrap_or(&self.composer).trim().to_string();
        if text.is_empty() {
            CHAT_SKIPPED.click();
            return SendOutcome::Skipped;
        }
        let edit_target = match self.resubmit_target {
            Some(message_id) if explicit => {
                let Some(idx) = self.position_of_user_message(message_id) else {
                    self.resubmit_target = None;
                    CHAT_SKIPPED.click();
                    return SendOutcome::Skipped;
                };
                Some((message_id, idx))
            }
            _ => None,
        };

        self.state = SendState::Sending;
        self.set_composer_enabled(false);

        let outcome = match edit_target {
            Some((message_id, idx)) => {
                self.resend_edit(conversation_id, message_id, idx, text).await
            }
            None => self.send_new(conversation_id, text).await,
        };

        // Runs on every path out of the request.
        self.resubmit_target = None;
        self.state = SendState::Idle;
        self.set_composer_enabled(true);
        self.view.focus_composer();

        if let SendOutcome::Failed(err) = &outcome {
            CHAT_FAILURES.click();
            if let Some(logger) = &self.logger {
                logger.log_failure(err);
            }
        }
        outcome
    }

    async fn send_new(&mut self, conversation_id: i64, text: String) -> SendOutcome {
        CHAT_SENDS.click();
        let user_view = self.append_message(MessageRole::User, &text, false);
        self.composer.clear();
        self.view.clear_composer();
        let assistant_view = self.append_message(MessageRole::Assistant, "", true);

        let request = ChatRequest::new(text, self.model.clone());
        if let Some(logger) = &self.logger {
            logger.log_request(&format!("/{}", chat_path(conversation_id)), &request);
        }
        let result = match self.transport.send_message(conversation_id, &request).await {
            Ok(stream) => self.consume_stream(stream, user_view, assistant_view).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => SendOutcome::Completed,
            Err(err) => {
                let inline = format!("Error: {}", err.message());
                self.update_message(assistant_view, |message| {
                    message.display_text = inline.clone();
                    message.content = MessageContent::Text(inline);
                    message.pending = false;
                });
                SendOutcome::Failed(err)
            }
        }
    }

    async fn resend_edit(
        &mut self,
        conversation_id: i64,
        message_id: i64,
        idx: usize,
        text: String,
    ) -> SendOutcome {
        CHAT_EDITS.click();
        let user_view = self.transcript[idx].view_id;
        let original_text = self.transcript[idx].display_text.clone();

        // Overwrite the bubble in place and take every later message out of view.
        self.update_message(user_view, |message| {
            message.display_text = text.clone();
            message.content = MessageContent::Text(text.clone());
        });
        let tail: Vec<MessageView> = self.transcript.drain(idx + 1..).collect();
        for message in &tail {
            self.view.message_removed(message.view_id);
        }
        let assistant_view = self.append_message(MessageRole::Assistant, "", true);

        let request = ChatRequest::new(text, self.model.clone());
        if let Some(logger) = &self.logger {
            logger.log_request(&format!("/{}", edit_path(conversation_id, message_id)), &request);
        }
        let result = match self
            .transport
            .edit_message(conversation_id, message_id, &request)
            .await
        {
            Ok(stream) => self.consume_stream(stream, user_view, assistant_view).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => SendOutcome::Completed,
            Err(err) => {
                self.remove_message(assistant_view);
                self.update_message(user_view, |message| {
                    message.display_text = original_text.clone();
                    message.content = MessageContent::Text(original_text);
                });
                self.view.messages_restored(user_view, &tail);
                self.transcript.extend(tail);
                self.view.show_error(err.message());
                SendOutcome::Failed(err)
            }
        }
    }

    /// Apply every event of a response stream to the transcript.
    async fn consume_stream(
        &mut self,
        stream: ByteStream,
        user_view: ViewId,
        assistant_view: ViewId,
    ) -> Result<()> {
        let start = Instant::now();
        let mut accumulator = StreamAccumulator::default();
        let mut events = Box::pin(process_sse(stream));

        while let Some(event) = events.next().await {
            let event = event?;
            if let Some(logger) = &self.logger {
                logger.log_stream_event(&event);
            }
            match event {
                ChatEvent::UserMessage { message_id } => {
                    self.bind_message_id(user_view, message_id);
                }
                ChatEvent::Token { content } => {
                    accumulator.push(&content);
                    let rendered = self.render_content(accumulator.text());
                    let text = accumulator.text().to_string();
                    self.update_message(assistant_view, |message| {
                        message.display_text = text;
                        message.content = rendered;
                    });
                    self.view.scroll_to_bottom();
                }
                ChatEvent::Usage(snapshot) => self.apply_usage(snapshot),
                ChatEvent::Other => {}
            }
        }
        STREAM_DURATION.add(start.elapsed().as_secs_f64());

        // One final render from the complete text.
        let text = accumulator.into_text();
        let rendered = self.render_content(&text);
        if let Some(logger) = &self.logger {
            logger.log_stream_complete(&text);
        }
        self.update_message(assistant_view, |message| {
            message.pending = false;
            message.display_text = text;
            message.content = rendered;
        });
        Ok(())
    }

    /// Enter edit mode on a prior user message.
    ///
    /// Returns false, changing nothing, while a request is in flight or when
    /// `message_id` is not an editable user message.  An edit already active
    /// on a different message is canceled first.
    pub fn start_inline_edit(&mut self, message_id: i64) -> bool {
        if self.state != SendState::Idle {
            return false;
        }
        let Some(idx) = self.position_of_user_message(message_id) else {
            return false;
        };
        if !self.transcript[idx].editable {
            return false;
        }
        if let Some(active) = &self.inline_edit {
            if active.message_id == message_id {
                return true;
            }
            self.cancel_inline_edit();
        }
        let message = &self.transcript[idx];
        self.inline_edit = Some(InlineEdit {
            message_id,
            view_id: message.view_id,
            draft: message.display_text.clone(),
        });
        self.view.edit_started(message);
        true
    }

    /// Replace the uncommitted text of the active edit.
    pub fn update_edit_draft(&mut self, text: &str) {
        if let Some(edit) = self.inline_edit.as_mut() {
            edit.draft = text.to_string();
        }
    }

    /// Discard the active edit and show the message's original text again.
    ///
    /// Returns false if no edit was active.
    pub fn cancel_inline_edit(&mut self) -> bool {
        let Some(edit) = self.inline_edit.take() else {
            return false;
        };
        if let Some(message) = self.transcript.iter().find(|m| m.view_id == edit.view_id) {
            self.view.edit_ended(message);
        }
        true
    }

    /// Resend the active edit's draft.
    ///
    /// A blank draft is a no-op and the edit stays active.
    pub async fn commit_inline_edit(&mut self) -> SendOutcome {
        if self.state != SendState::Idle {
            return SendOutcome::Skipped;
        }
        let Some(edit) = self.inline_edit.as_ref() else {
            return SendOutcome::Skipped;
        };
        let text = edit.draft.trim().to_string();
        if text.is_empty() {
            return SendOutcome::Skipped;
        }
        let Some(edit) = self.inline_edit.take() else {
            return SendOutcome::Skipped;
        };
        if let Some(message) = self.transcript.iter().find(|m| m.view_id == edit.view_id) {
            self.view.edit_ended(message);
        }
        self.resubmit_target = Some(edit.message_id);
        self.send_message(Some(&text)).await
    }

    /// Replace the composer text.
    pub fn set_composer_text(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    /// Returns the composer text.
    pub fn composer_text(&self) -> &str {
        &self.composer
    }

    /// Returns true if the composer accepts input.
    pub fn is_composer_enabled(&self) -> bool {
        self.composer_enabled
    }

    /// Returns whether a request is in flight.
    pub fn state(&self) -> SendState {
        self.state
    }

    /// Returns the transcript in display order.
    pub fn transcript(&self) -> &[MessageView] {
        &self.transcript
    }

    /// Returns the message id under inline edit, if any.
    pub fn editing_message_id(&self) -> Option<i64> {
        self.inline_edit.as_ref().map(|edit| edit.message_id)
    }

    /// Returns the uncommitted text of the active edit, if any.
    pub fn edit_draft(&self) -> Option<&str> {
        self.inline_edit.as_ref().map(|edit| edit.draft.as_str())
    }

    /// Returns the latest usage snapshot, if one has been received.
    pub fn usage(&self) -> Option<&UsageSnapshot> {
        self.usage.as_ref()
    }

    /// Returns the conversation this controller is bound to.
    pub fn conversation(&self) -> ConversationRef {
        self.conversation
    }

    /// Returns the model sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Changes the model sent with subsequent requests.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Returns the view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Returns the view for mutation.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn allocate_view_id(&mut self) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        id
    }

    fn append_message(&mut self, role: MessageRole, text: &str, pending: bool) -> ViewId {
        let view_id = self.allocate_view_id();
        let message = MessageView {
            view_id,
            role,
            message_id: None,
            display_text: text.to_string(),
            content: MessageContent::Text(text.to_string()),
            editable: false,
            pending,
        };
        self.view.message_appended(&message);
        self.transcript.push(message);
        self.view.scroll_to_bottom();
        view_id
    }

    fn update_message(&mut self, view_id: ViewId, f: impl FnOnce(&mut MessageView)) {
        if let Some(message) = self.transcript.iter_mut().find(|m| m.view_id == view_id) {
            f(message);
            self.view.message_updated(message);
        }
    }

    fn remove_message(&mut self, view_id: ViewId) {
        if let Some(idx) = self.transcript.iter().position(|m| m.view_id == view_id) {
            self.transcript.remove(idx);
            self.view.message_removed(view_id);
        }
    }

    fn message(&self, view_id: ViewId) -> Option<&MessageView> {
        self.transcript.iter().find(|m| m.view_id == view_id)
    }

    fn position_of_user_message(&self, message_id: i64) -> Option<usize> {
        self.transcript
            .iter()
            .position(|m| m.is_user() && m.message_id == Some(message_id))
    }

    fn bind_message_id(&mut self, view_id: ViewId, message_id: i64) {
        let unbound = self
            .message(view_id)
            .is_some_and(|message| message.message_id.is_none());
        if unbound {
            self.update_message(view_id, |message| {
                message.message_id = Some(message_id);
                message.editable = true;
            });
        }
    }

    fn render_content(&self, markdown: &str) -> MessageContent {
        match &self.renderer {
            Some(renderer) => MessageContent::Html(renderer.render(markdown)),
            None => MessageContent::Text(markdown.to_string()),
        }
    }

    fn apply_usage(&mut self, snapshot: UsageSnapshot) {
        self.usage = Some(snapshot);
        self.view.show_usage(&UsageDisplay::new(snapshot));
    }

    fn set_composer_enabled(&mut self, enabled: bool) {
        self.composer_enabled = enabled;
        self.view.set_composer_enabled(enabled);
    }
}

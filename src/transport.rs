//! The seam between the session controller and the network.
//!
//! The controller never talks to reqwest directly; it is handed something
//! that implements [`ChatTransport`].  [`crate::CvBot`] is the production
//! implementation, and tests substitute scripted byte streams.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::{ChatRequest, Result, UsageSnapshot};

/// An incrementally readable response body.
///
/// `Some(Ok(chunk))` is a partial read, `Some(Err(_))` is a transport failure
/// and `None` is a clean end-of-stream.  Chunk boundaries carry no meaning:
/// they may split lines and multi-byte characters.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Issues chat requests and hands back their streamed bodies.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// `POST /api/chat/{conversation_id}`.
    ///
    /// A non-success status must be returned as `Err`, carrying the server's
    /// message when it supplied one.
    async fn send_message(&self, conversation_id: i64, request: &ChatRequest)
    -> Result<ByteStream>;

    /// `POST /api/chat/{conversation_id}/edit/{message_id}`.
    ///
    /// Same contract as [`ChatTransport::send_message`].
    async fn edit_message(
        &self,
        conversation_id: i64,
        message_id: i64,
        request: &ChatRequest,
    ) -> Result<ByteStream>;

    /// `GET /api/costs/today`.
    async fn costs_today(&self) -> Result<UsageSnapshot>;
}

/// Request path for a new message.
pub fn chat_path(conversation_id: i64) -> String {
    format!("api/chat/{conversation_id}")
}

/// Request path for an edit-and-resend of `message_id`.
pub fn edit_path(conversation_id: i64, message_id: i64) -> String {
    format!("api/chat/{conversation_id}/edit/{message_id}")
}

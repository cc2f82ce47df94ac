//! Logging trait for chat traffic.
//!
//! This module provides the [`ChatLogger`] trait that lets an application
//! capture every request the session controller issues and every event it
//! decodes from a response stream.

use crate::{ChatEvent, ChatRequest, Error};

/// A trait for logging chat session traffic.
///
/// Implement this trait to record the exchange between the controller and
/// the chat server.  All methods are called from the controller's task, in
/// order; none of them may fail the send they observe.
///
/// # Example
///
/// ```rust,ignore
/// use cvbot_chat::{ChatEvent, ChatLogger, ChatRequest, Error};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ChatLogger for FileLogger {
///     fn log_request(&self, endpoint: &str, request: &ChatRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "POST {endpoint}: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_stream_event(&self, event: &ChatEvent) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "event: {}", serde_json::to_string(event).unwrap()).unwrap();
///     }
///
///     fn log_stream_complete(&self, text: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "complete: {} bytes", text.len()).unwrap();
///     }
///
///     fn log_failure(&self, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "failed: {error}").unwrap();
///     }
/// }
/// ```
pub trait ChatLogger: Send + Sync {
    /// Log a request just before it is issued.
    ///
    /// `endpoint` is the request path, e.g. `/api/chat/3/edit/17`.
    fn log_request(&self, endpoint: &str, request: &ChatRequest);

    /// Log an individual decoded stream event.
    ///
    /// Malformed payloads are skipped before they reach the logger.
    fn log_stream_event(&self, event: &ChatEvent);

    /// Log the full assistant text once a stream completes successfully.
    fn log_stream_complete(&self, text: &str);

    /// Log a request that failed at the transport or status level.
    fn log_failure(&self, error: &Error) {
        _ = error;
    }
}

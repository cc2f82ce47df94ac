//! Server-Sent Events (SSE) processing for streamed chat responses.
//!
//! The chat server frames its response as `data: <payload>` lines over a
//! chunked body.  This module turns the raw byte stream into [`ChatEvent`]s:
//! bytes are decoded to text incrementally, the text is split into lines, and
//! each `data:` line is decoded on a best-effort basis.  Lines that are not
//! `data:` lines, the `[DONE]` sentinel, and payloads that fail to decode are
//! all skipped without ending the stream.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_EVENTS, STREAM_MALFORMED};
use crate::{ChatEvent, Result};

/// Prefix of every line that carries a payload.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the logical end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// The result of classifying one line of an event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// The line does not start with the `data: ` prefix.
    Ignored,
    /// The `[DONE]` sentinel.  Carries no event and is never parsed as JSON.
    Done,
    /// A payload that decoded to an event.
    Event(ChatEvent),
    /// A `data:` payload that is not a valid event.
    Malformed,
}

impl SseLine {
    /// Returns the event, if this line carried one.
    pub fn into_event(self) -> Option<ChatEvent> {
        match self {
            SseLine::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Classify a single line of the stream (without its line terminator).
pub fn parse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return SseLine::Done;
    }
    match serde_json::from_str::<ChatEvent>(payload) {
        Ok(event) => SseLine::Event(event),
        Err(_) => SseLine::Malformed,
    }
}

/// Incremental UTF-8 decoder that also splits the decoded text into lines.
///
/// A multi-byte character split across two chunks is held back until its
/// remaining bytes arrive; a line split across two chunks is held back until
/// its terminator arrives.  Invalid byte sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending_bytes: Vec<u8>,
    pending_line: String,
}

impl LineDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending_bytes.extend_from_slice(chunk);
        let text = self.decode_available();
        self.pending_line.push_str(&text);
        self.take_complete_lines()
    }

    /// Flush at end of stream, returning the final unterminated line if any.
    ///
    /// Bytes of an incomplete character left over at this point decode to U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.pending_bytes.clear();
            self.pending_line.push_str(&tail);
        }
        if self.pending_line.is_empty() {
            None
        } else {
            let line = std::mem::take(&mut self.pending_line);
            Some(strip_carriage_return(line))
        }
    }

    fn decode_available(&mut self) -> String {
        let mut out = String::new();
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending_bytes[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending_bytes.len();
                    break;
                }
                Err(err) => {
                    let valid_up_to = start + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(
                        &self.pending_bytes[start..valid_up_to],
                    ));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_up_to + len;
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            start = valid_up_to;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes.drain(..start);
        out
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(idx) = self.pending_line.find('\n') {
            let rest = self.pending_line.split_off(idx + 1);
            let mut line = std::mem::replace(&mut self.pending_line, rest);
            line.pop();
            lines.push(strip_carriage_return(line));
        }
        lines
    }
}

fn strip_carriage_return(mut line: String) -> String {
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Process a stream of bytes into a stream of chat events.
///
/// Transport errors are passed through as `Err` items; the caller decides
/// whether to stop.  Malformed payloads and non-event lines never surface.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatEvent>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let state = SseState {
        stream: byte_stream,
        decoder: LineDecoder::new(),
        lines: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            // First drain any complete lines we already have.
            while let Some(line) = state.lines.pop_front() {
                match parse_line(&line) {
                    SseLine::Event(event) => {
                        STREAM_EVENTS.click();
                        return Some((Ok(event), state));
                    }
                    SseLine::Malformed => STREAM_MALFORMED.click(),
                    SseLine::Ignored | SseLine::Done => {}
                }
            }

            if state.exhausted {
                return None;
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    let lines = state.decoder.push(&bytes);
                    state.lines.extend(lines);
                }
                Some(Err(e)) => {
                    return Some((Err(e), state));
                }
                None => {
                    // End of stream
                    state.exhausted = true;
                    if let Some(line) = state.decoder.finish() {
                        state.lines.push_back(line);
                    }
                }
            }
        }
    })
}

struct SseState<S> {
    stream: S,
    decoder: LineDecoder,
    lines: VecDeque<String>,
    exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, UsageSnapshot};

    fn chunks(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes>> + Unpin {
        stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(parts: Vec<&'static [u8]>) -> Vec<Result<ChatEvent>> {
        process_sse(chunks(parts)).collect().await
    }

    fn token(s: &str) -> ChatEvent {
        ChatEvent::Token {
            content: s.to_string(),
        }
    }

    #[test]
    fn done_sentinel_is_not_an_event() {
        assert_eq!(parse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_line("data: [DONE]").into_event(), None);
    }

    #[test]
    fn non_data_lines_are_ignored() {
        assert_eq!(parse_line(""), SseLine::Ignored);
        assert_eq!(parse_line("event: token"), SseLine::Ignored);
        assert_eq!(parse_line("data:{\"type\":\"token\"}"), SseLine::Ignored);
    }

    #[test]
    fn malformed_payload() {
        assert_eq!(parse_line("data: {not json"), SseLine::Malformed);
        assert_eq!(parse_line("data: {\"type\":\"token\"}"), SseLine::Malformed);
    }

    #[test]
    fn payload_is_trimmed() {
        assert_eq!(
            parse_line("data:  {\"type\":\"token\",\"content\":\"a\"}  "),
            SseLine::Event(token("a"))
        );
    }

    #[test]
    fn decoder_holds_split_multibyte_characters() {
        let mut decoder = LineDecoder::new();
        let bytes = "data: é\n".as_bytes();
        // 'é' is two bytes; split between them.
        let split = "data: ".len() + 1;
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["data: é".to_string()]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"a\xffb\n"), vec!["a\u{fffd}b".to_string()]);
    }

    #[test]
    fn decoder_strips_crlf_and_flushes_tail() {
        let mut decoder = LineDecoder::new();
        assert_eq!(
            decoder.push(b"one\r\ntwo\r\nthr"),
            vec!["one".to_string(), "two".to_string()]
        );
        assert_eq!(decoder.finish(), Some("thr".to_string()));
    }

    #[tokio::test]
    async fn parse_token_events() {
        let events = collect(vec![
            b"data: {\"type\":\"token\",\"content\":\"Hel\"}\n\n",
            b"data: {\"type\":\"token\",\"content\":\"lo\"}\n\ndata: [DONE]\n\n",
        ])
        .await;
        let events: Vec<ChatEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events, vec![token("Hel"), token("lo")]);
    }

    #[tokio::test]
    async fn handle_split_event() {
        let events = collect(vec![
            b"data: {\"type\":\"tok",
            b"en\",\"content\":\"x\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &token("x"));
    }

    #[tokio::test]
    async fn malformed_line_between_tokens_is_skipped() {
        let events = collect(vec![
            b"data: {\"type\":\"token\",\"content\":\"a\"}\n\n",
            b"data: {not json\n\n",
            b"data: {\"type\":\"token\",\"content\":\"b\"}\n\n",
        ])
        .await;
        let events: Vec<ChatEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events, vec![token("a"), token("b")]);
    }

    #[tokio::test]
    async fn unterminated_final_line_is_processed() {
        let events = collect(vec![b"data: {\"type\":\"user_message\",\"message_id\":9}"]).await;
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatEvent::UserMessage { message_id: 9 }
        );
    }

    #[tokio::test]
    async fn usage_event() {
        let events = collect(vec![
            b"data: {\"type\":\"usage\",\"input_tokens\":3,\"output_tokens\":4,\"daily_total_usd\":5,\"daily_limit_usd\":10}\n\n",
        ])
        .await;
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatEvent::Usage(UsageSnapshot::new(3, 4, 5.0, 10.0))
        );
    }

    #[tokio::test]
    async fn transport_error_is_passed_through() {
        let parts: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"token\",\"content\":\"a\"}\n")),
            Err(Error::streaming("connection reset", None)),
        ];
        let events: Vec<Result<ChatEvent>> = process_sse(stream::iter(parts)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(Error::Streaming { .. })));
    }
}

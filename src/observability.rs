use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("cvbot.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("cvbot.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("cvbot.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("cvbot.stream.events");
pub(crate) static STREAM_MALFORMED: Counter = Counter::new("cvbot.stream.malformed");
pub(crate) static STREAM_BYTES: Counter = Counter::new("cvbot.stream.bytes");
pub(crate) static STREAM_DURATION: Moments = Moments::new("cvbot.stream.duration_seconds");

pub(crate) static CHAT_SENDS: Counter = Counter::new("cvbot.chat.sends");
pub(crate) static CHAT_EDITS: Counter = Counter::new("cvbot.chat.edits");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("cvbot.chat.failures");
pub(crate) static CHAT_SKIPPED: Counter = Counter::new("cvbot.chat.skipped");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_MALFORMED);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_EDITS);
    collector.register_counter(&CHAT_FAILURES);
    collector.register_counter(&CHAT_SKIPPED);
}

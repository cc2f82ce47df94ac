use serde::{Deserialize, Serialize};

/// The most recently reported token and cost summary for the current day.
///
/// Snapshots are replaced wholesale on every update; a field the server
/// omits is zero rather than carried over from the previous snapshot.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageSnapshot {
    /// Input tokens consumed by the last request.
    #[serde(default)]
    pub input_tokens: u64,

    /// Output tokens produced by the last request.
    #[serde(default)]
    pub output_tokens: u64,

    /// Total spend for today, in US dollars.
    #[serde(default)]
    pub daily_total_usd: f64,

    /// Configured daily spend limit, in US dollars.
    #[serde(default)]
    pub daily_limit_usd: f64,
}

impl UsageSnapshot {
    /// Create a new `UsageSnapshot`.
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        daily_total_usd: f64,
        daily_limit_usd: f64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            daily_total_usd,
            daily_limit_usd,
        }
    }

    /// Returns a copy of this snapshot with the token counts zeroed.
    ///
    /// The daily cost endpoint reports day-wide token totals under different
    /// keys, so per-request counts are unknown until the first streamed usage event.
    pub fn without_tokens(self) -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            ..self
        }
    }

    /// Returns true if any tokens or spend have been recorded.
    pub fn has_any_usage(&self) -> bool {
        self.input_tokens > 0 || self.output_tokens > 0 || self.daily_total_usd > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn usage_snapshot_full() {
        let usage: UsageSnapshot = from_value(json!({
            "input_tokens": 120,
            "output_tokens": 45,
            "daily_total_usd": 0.25,
            "daily_limit_usd": 2.0
        }))
        .unwrap();
        assert_eq!(usage, UsageSnapshot::new(120, 45, 0.25, 2.0));
    }

    #[test]
    fn usage_snapshot_missing_fields_are_zero() {
        let usage: UsageSnapshot = from_value(json!({
            "daily_total_usd": 1.5,
            "daily_limit_usd": 2.0,
            "daily_input_tokens": 900,
            "total_cost_usd": 14.0
        }))
        .unwrap();
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.output_tokens, 0);
        assert_eq!(usage.daily_total_usd, 1.5);
    }

    #[test]
    fn has_any_usage() {
        assert!(!UsageSnapshot::default().has_any_usage());
        assert!(UsageSnapshot::new(1, 0, 0.0, 0.0).has_any_usage());
        assert!(UsageSnapshot::new(0, 0, 0.01, 0.0).has_any_usage());
    }
}

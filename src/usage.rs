//! Presentation of a [`UsageSnapshot`].

use crate::UsageSnapshot;

/// Everything a view needs to draw the daily usage meter.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageDisplay {
    /// The snapshot this display was computed from.
    pub snapshot: UsageSnapshot,
    /// Fill of the progress bar, in `[0, 100]`.
    pub percent: f64,
    /// e.g. `"120 in / 45 out tokens"`.
    pub token_text: String,
    /// Today's spend, e.g. `"$0.25"`.
    pub current_cost: String,
    /// The daily limit, e.g. `"$2.00"`.
    pub max_cost: String,
}

impl UsageDisplay {
    /// Compute the display for `snapshot`.
    pub fn new(snapshot: UsageSnapshot) -> Self {
        Self {
            percent: usage_percent(&snapshot),
            token_text: format!(
                "{} in / {} out tokens",
                snapshot.input_tokens, snapshot.output_tokens
            ),
            current_cost: format_usd(snapshot.daily_total_usd),
            max_cost: format_usd(snapshot.daily_limit_usd),
            snapshot,
        }
    }
}

impl From<UsageSnapshot> for UsageDisplay {
    fn from(snapshot: UsageSnapshot) -> Self {
        Self::new(snapshot)
    }
}

/// Percentage of the daily limit spent, clamped to `[0, 100]`.
///
/// Any recorded usage shows at least 1% so a tiny spend is still visible.
/// With no positive limit the meter is empty.
pub fn usage_percent(snapshot: &UsageSnapshot) -> f64 {
    if snapshot.daily_limit_usd <= 0.0 {
        return 0.0;
    }
    let raw = snapshot.daily_total_usd / snapshot.daily_limit_usd * 100.0;
    let floor = if snapshot.has_any_usage() { 1.0 } else { 0.0 };
    let pct = raw.max(floor).min(100.0);
    if pct.is_nan() { 0.0 } else { pct }
}

/// Format dollars with two decimals.
pub fn format_usd(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: f64, limit: f64) -> UsageSnapshot {
        UsageSnapshot::new(0, 0, total, limit)
    }

    #[test]
    fn percent_zero_limit() {
        assert_eq!(usage_percent(&snapshot(0.0, 0.0)), 0.0);
        assert_eq!(usage_percent(&snapshot(3.0, 0.0)), 0.0);
    }

    #[test]
    fn percent_half() {
        assert_eq!(usage_percent(&snapshot(5.0, 10.0)), 50.0);
    }

    #[test]
    fn percent_clamps_to_hundred() {
        assert_eq!(usage_percent(&snapshot(15.0, 10.0)), 100.0);
    }

    #[test]
    fn percent_floor_for_tiny_usage() {
        assert_eq!(usage_percent(&snapshot(0.001, 10.0)), 1.0);
        assert_eq!(
            usage_percent(&UsageSnapshot::new(10, 5, 0.0, 10.0)),
            1.0
        );
        assert_eq!(usage_percent(&snapshot(0.0, 10.0)), 0.0);
    }

    #[test]
    fn display_labels() {
        let display = UsageDisplay::new(UsageSnapshot::new(120, 45, 0.254, 2.0));
        assert_eq!(display.token_text, "120 in / 45 out tokens");
        assert_eq!(display.current_cost, "$0.25");
        assert_eq!(display.max_cost, "$2.00");
        assert!((display.percent - 12.7).abs() < 1e-9);
    }
}

use serde::{Deserialize, Serialize};
use time::Date;

/// One row of `GET /api/costs/daily`: spend for one model on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyCost {
    /// The calendar day.
    #[serde(with = "crate::utils::time::date")]
    pub date: Date,
    /// The model identifier.
    pub model: String,
    /// Total spend in US dollars.
    pub total: f64,
    /// Number of requests.
    pub calls: u64,
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Input plus output tokens.
    pub total_tokens: u64,
    /// Price per million input tokens, when the model's pricing is known.
    #[serde(default)]
    pub input_cost_per_1m: Option<f64>,
    /// Price per million output tokens, when the model's pricing is known.
    #[serde(default)]
    pub output_cost_per_1m: Option<f64>,
}

/// One row of `GET /api/costs/monthly`: spend for one model in one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyCost {
    /// The month as `YYYY-MM`.
    pub month: String,
    /// The model identifier.
    pub model: String,
    /// Total spend in US dollars.
    pub total: f64,
    /// Number of requests.
    pub calls: u64,
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Input plus output tokens.
    pub total_tokens: u64,
    /// Price per million input tokens, when the model's pricing is known.
    #[serde(default)]
    pub input_cost_per_1m: Option<f64>,
    /// Price per million output tokens, when the model's pricing is known.
    #[serde(default)]
    pub output_cost_per_1m: Option<f64>,
}

/// A point on the cumulative cost line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CumulativeCost {
    /// The calendar day.
    pub date: Date,
    /// Spend on this day across all models.
    pub day_total: f64,
    /// Spend from the first reported day through this day.
    pub cumulative: f64,
}

/// Folds per-model daily rows into one running total per day, in date order.
pub fn cumulative_daily_totals(rows: &[DailyCost]) -> Vec<CumulativeCost> {
    let mut sorted: Vec<&DailyCost> = rows.iter().collect();
    sorted.sort_by_key(|row| row.date);

    let mut points: Vec<CumulativeCost> = Vec::new();
    let mut running = 0.0;
    for row in sorted {
        running += row.total;
        match points.last_mut() {
            Some(last) if last.date == row.date => {
                last.day_total += row.total;
                last.cumulative = running;
            }
            _ => points.push(CumulativeCost {
                date: row.date,
                day_total: row.total,
                cumulative: running,
            }),
        }
    }
    points
}

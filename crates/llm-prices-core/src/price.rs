use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A current price for one model at one provider, with optional
/// day-over-day percentage deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub model: String,
    pub provider: String,
    #[serde(rename = "input_price_per_1m")]
    pub input_price_per_m: f64,
    #[serde(rename = "output_price_per_1m")]
    pub output_price_per_m: f64,
    #[serde(rename = "input_price_change", default, skip_serializing_if = "Option::is_none")]
    pub input_change_pct: Option<f64>,
    #[serde(rename = "output_price_change", default, skip_serializing_if = "Option::is_none")]
    pub output_change_pct: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

/// One timestamped price sample. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "input_price_per_1m")]
    pub input_price_per_m: f64,
    #[serde(rename = "output_price_per_1m")]
    pub output_price_per_m: f64,
}

/// Historical samples for one model at one provider. `points` are in
/// the order the source produced them, which is not guaranteed sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub model: String,
    pub provider: String,
    #[serde(rename = "prices")]
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Points sorted chronologically, oldest first.
    pub fn sorted_points(&self) -> Vec<PricePoint> {
        let mut points = self.points.clone();
        points.sort_by_key(|p| p.timestamp);
        points
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<PricePoint> {
        self.points.iter().max_by_key(|p| p.timestamp).copied()
    }

    /// Percentage change between the two most recent samples of the
    /// given scalar. None with fewer than two samples or a zero base.
    pub fn change_pct(&self, input: bool) -> Option<f64> {
        let sorted = self.sorted_points();
        let [.., prev, last] = sorted.as_slice() else {
            return None;
        };
        let pick = |p: &PricePoint| {
            if input {
                p.input_price_per_m
            } else {
                p.output_price_per_m
            }
        };
        let (prev, last) = (pick(prev), pick(last));
        (prev != 0.0).then(|| (last - prev) / prev * 100.0)
    }
}

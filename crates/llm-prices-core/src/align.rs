//! Merges per-model price histories onto a shared day-labeled timeline,
//! the shape a multi-series line chart consumes directly.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::price::{PriceHistory, PricePoint};

/// Which price scalar a chart row carries. A row holds one scalar per
/// model, never both; switching the field means re-aligning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Input,
    Output,
}

impl PriceField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    fn pick(self, p: &PricePoint) -> f64 {
        match self {
            Self::Input => p.input_price_per_m,
            Self::Output => p.output_price_per_m,
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" | "in" => Ok(Self::Input),
            "output" | "out" => Ok(Self::Output),
            other => Err(format!("unknown price field: {other}")),
        }
    }
}

/// Inclusive instant interval for pre-alignment filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Inclusive range covering whole calendar days, midnight to 23:59:59.
    pub fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            end: end.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc(),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Day-granularity display format. Lossy: distinct instants on the same
/// UTC day share a label and become indistinguishable downstream.
pub const DAY_LABEL_FORMAT: &str = "%Y-%m-%d";

pub fn day_label(ts: DateTime<Utc>) -> String {
    ts.date_naive().format(DAY_LABEL_FORMAT).to_string()
}

/// One chart row: a day label plus one cell per model that had an
/// observation on that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub label: String,
    pub cells: BTreeMap<String, f64>,
}

/// Merge histories onto a day-labeled timeline.
///
/// Each observation is projected through `field`, bucketed by its day
/// label, and written into that row's cell for the series' model.
/// Within a (row, model) cell the last observation in input order wins.
/// When `range` is given, observations outside the inclusive interval
/// are dropped before bucketing; `None` is the explicit everything mode
/// used by the comparison preview, not an accidental default.
///
/// Rows come back sorted ascending by the date re-parsed from the label,
/// so instants that collapsed into one label stay collapsed. Pure and
/// total: empty input or a range excluding everything yields an empty
/// table.
pub fn align(
    series: &[PriceHistory],
    field: PriceField,
    range: Option<&DateRange>,
) -> Vec<AlignedRow> {
    let mut buckets: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    for history in series {
        for point in &history.points {
            if let Some(r) = range {
                if !r.contains(point.timestamp) {
                    continue;
                }
            }
            buckets
                .entry(day_label(point.timestamp))
                .or_default()
                .insert(history.model.clone(), field.pick(point));
        }
    }

    let mut rows: Vec<AlignedRow> = buckets
        .into_iter()
        .filter_map(|(label, cells)| {
            let date = NaiveDate::parse_from_str(&label, DAY_LABEL_FORMAT).ok()?;
            Some(AlignedRow { date, label, cells })
        })
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}

/// Model names that contribute at least one cell, in first-seen row order.
pub fn series_names(rows: &[AlignedRow]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        for name in row.cells.keys() {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn field_parsing_rejects_garbage() {
        assert_eq!("input".parse::<PriceField>(), Ok(PriceField::Input));
        assert_eq!("OUT".parse::<PriceField>(), Ok(PriceField::Output));
        assert!("both".parse::<PriceField>().is_err());
        assert!("".parse::<PriceField>().is_err());
    }

    #[test]
    fn day_label_truncates_to_utc_day() {
        let morning = Utc.with_ymd_and_hms(2025, 3, 1, 0, 5, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2025, 3, 1, 23, 55, 0).unwrap();
        assert_eq!(day_label(morning), "2025-03-01");
        assert_eq!(day_label(morning), day_label(night));
    }

    #[test]
    fn label_round_trips_through_parse() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 31, 18, 0, 0).unwrap();
        let label = day_label(ts);
        let parsed = NaiveDate::parse_from_str(&label, DAY_LABEL_FORMAT).unwrap();
        assert_eq!(parsed, ts.date_naive());
    }

    #[test]
    fn range_is_inclusive_at_both_ends() {
        let r = DateRange::days(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        );
        assert!(r.contains(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
        assert!(r.contains(Utc.with_ymd_and_hms(2025, 3, 2, 23, 59, 59).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()));
    }

    #[test]
    fn series_names_preserve_first_seen_order() {
        let mut early = BTreeMap::new();
        early.insert("B".to_string(), 1.0);
        let mut late = BTreeMap::new();
        late.insert("A".to_string(), 2.0);
        late.insert("B".to_string(), 3.0);
        let rows = vec![
            AlignedRow {
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                label: "2025-03-01".to_string(),
                cells: early,
            },
            AlignedRow {
                date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                label: "2025-03-02".to_string(),
                cells: late,
            },
        ];
        assert_eq!(series_names(&rows), vec!["B".to_string(), "A".to_string()]);
    }
}

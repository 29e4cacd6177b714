use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use llm_prices_core::align::{align, series_names, AlignedRow, DateRange, PriceField};
use llm_prices_core::price::{PriceHistory, PricePoint};

fn point(day: u32, hour: u32, input: f64, output: f64) -> PricePoint {
    PricePoint {
        timestamp: Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
        input_price_per_m: input,
        output_price_per_m: output,
    }
}

fn series(model: &str, points: Vec<PricePoint>) -> PriceHistory {
    PriceHistory {
        model: model.to_string(),
        provider: "OpenAI".to_string(),
        points,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn cell(row: &AlignedRow, model: &str) -> f64 {
    row.cells[model]
}

/// The worked example: A has day1+day2, B has day1 only, field=input.
fn example_series() -> Vec<PriceHistory> {
    vec![
        series("A", vec![point(1, 9, 10.0, 20.0), point(2, 9, 12.0, 22.0)]),
        series("B", vec![point(1, 15, 5.0, 8.0)]),
    ]
}

#[test]
fn input_field_merges_same_day_across_models() {
    let rows = align(&example_series(), PriceField::Input, None);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].date, day(1));
    assert_eq!(cell(&rows[0], "A"), 10.0);
    assert_eq!(cell(&rows[0], "B"), 5.0);

    assert_eq!(rows[1].date, day(2));
    assert_eq!(cell(&rows[1], "A"), 12.0);
    assert!(!rows[1].cells.contains_key("B"));
}

#[test]
fn output_field_projects_the_other_scalar() {
    let rows = align(&example_series(), PriceField::Output, None);
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&rows[0], "A"), 20.0);
    assert_eq!(cell(&rows[0], "B"), 8.0);
    assert_eq!(cell(&rows[1], "A"), 22.0);
}

#[test]
fn range_excluding_day2_drops_its_row() {
    let range = DateRange::days(day(1), day(1));
    let rows = align(&example_series(), PriceField::Input, Some(&range));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, day(1));
    assert_eq!(cell(&rows[0], "A"), 10.0);
    assert_eq!(cell(&rows[0], "B"), 5.0);
}

#[test]
fn range_excluding_everything_yields_empty() {
    let range = DateRange::days(day(20), day(25));
    assert!(align(&example_series(), PriceField::Input, Some(&range)).is_empty());
}

#[test]
fn missing_range_means_no_filtering() {
    let filtered = align(
        &example_series(),
        PriceField::Input,
        Some(&DateRange::days(day(1), day(2))),
    );
    let unfiltered = align(&example_series(), PriceField::Input, None);
    assert_eq!(filtered, unfiltered);
}

#[test]
fn empty_series_yields_empty_table() {
    assert!(align(&[], PriceField::Input, None).is_empty());
    let hollow = vec![series("A", vec![]), series("B", vec![])];
    assert!(align(&hollow, PriceField::Input, None).is_empty());
}

#[test]
fn same_day_same_model_last_write_wins() {
    // Two observations for A on day 1, deliberately out of chronological
    // order: the second in input order must win, not the later instant
    // and not an average.
    let s = vec![series(
        "A",
        vec![point(1, 18, 10.0, 20.0), point(1, 6, 99.0, 88.0)],
    )];
    let rows = align(&s, PriceField::Input, None);
    assert_eq!(rows.len(), 1);
    assert_eq!(cell(&rows[0], "A"), 99.0);
}

#[test]
fn later_series_overwrites_same_model_cell() {
    let s = vec![
        series("A", vec![point(1, 9, 10.0, 20.0)]),
        series("A", vec![point(1, 9, 11.0, 21.0)]),
    ];
    let rows = align(&s, PriceField::Input, None);
    assert_eq!(rows.len(), 1);
    assert_eq!(cell(&rows[0], "A"), 11.0);
}

#[test]
fn rows_sorted_ascending_from_unsorted_input() {
    let s = vec![series(
        "A",
        vec![point(9, 9, 3.0, 6.0), point(2, 9, 1.0, 2.0), point(5, 9, 2.0, 4.0)],
    )];
    let rows = align(&s, PriceField::Input, None);
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(2), day(5), day(9)]);
}

#[test]
fn row_count_bounded_by_labels_and_observations() {
    let s = vec![
        series("A", vec![point(1, 6, 1.0, 2.0), point(1, 18, 1.1, 2.1), point(2, 9, 1.2, 2.2)]),
        series("B", vec![point(2, 9, 9.0, 9.5)]),
    ];
    let rows = align(&s, PriceField::Input, None);
    let observations: usize = s.iter().map(|h| h.points.len()).sum();
    assert_eq!(rows.len(), 2); // distinct labels: day1, day2
    assert!(rows.len() <= observations);
}

#[test]
fn align_is_deterministic() {
    let a = align(&example_series(), PriceField::Output, None);
    let b = align(&example_series(), PriceField::Output, None);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap(),
    );
}

#[test]
fn realigning_an_aligned_projection_is_idempotent() {
    let first = align(&example_series(), PriceField::Input, None);

    // Rebuild one history per model from the aligned table, then align
    // again with the same field.
    let mut by_model: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for row in &first {
        for (model, value) in &row.cells {
            by_model.entry(model.clone()).or_default().push(PricePoint {
                timestamp: row.date.and_hms_opt(12, 0, 0).unwrap().and_utc(),
                input_price_per_m: *value,
                output_price_per_m: *value,
            });
        }
    }
    let rebuilt: Vec<PriceHistory> = by_model
        .into_iter()
        .map(|(model, points)| series(&model, points))
        .collect();

    let second = align(&rebuilt, PriceField::Input, None);
    assert_eq!(first, second);
}

#[test]
fn series_names_cover_all_contributors() {
    let rows = align(&example_series(), PriceField::Input, None);
    assert_eq!(series_names(&rows), vec!["A".to_string(), "B".to_string()]);
}

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use llm_prices_core::align::{self, DateRange, PriceField};
use llm_prices_core::mock::MockSource;
use llm_prices_core::model;
use llm_prices_core::price::PriceHistory;

// ---------------------------------------------------------------------------
// Series alignment
// ---------------------------------------------------------------------------

fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, align::DAY_LABEL_FORMAT).ok()
}

/// Merge per-model histories onto a day-labeled chart table.
/// `field` is "input" or "output"; `start`/`end` (YYYY-MM-DD, inclusive)
/// filter observations before alignment when both are given.
/// Returns an array of {date, label, cells} rows or null on bad input.
#[wasm_bindgen]
pub fn align_series(
    series: JsValue,
    field: &str,
    start: Option<String>,
    end: Option<String>,
) -> JsValue {
    let series: Vec<PriceHistory> = match serde_wasm_bindgen::from_value(series) {
        Ok(s) => s,
        Err(_) => return JsValue::NULL,
    };
    let field: PriceField = match field.parse() {
        Ok(f) => f,
        Err(_) => return JsValue::NULL,
    };
    let range = match (start.as_deref(), end.as_deref()) {
        (Some(start), Some(end)) => match (parse_day(start), parse_day(end)) {
            (Some(from), Some(to)) => Some(DateRange::days(from, to)),
            _ => return JsValue::NULL,
        },
        (None, None) => None,
        _ => return JsValue::NULL,
    };

    let rows = align::align(&series, field, range.as_ref());
    serde_wasm_bindgen::to_value(&rows).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Mock data layer
// ---------------------------------------------------------------------------

/// Known providers with their model counts.
#[wasm_bindgen]
pub fn mock_providers() -> JsValue {
    serde_wasm_bindgen::to_value(&MockSource::new().providers()).unwrap_or(JsValue::NULL)
}

/// All known models with their providers.
#[wasm_bindgen]
pub fn mock_models() -> JsValue {
    serde_wasm_bindgen::to_value(&MockSource::new().models()).unwrap_or(JsValue::NULL)
}

/// Current prices for a provider, "all" for the union.
#[wasm_bindgen]
pub fn mock_prices(provider: &str) -> JsValue {
    serde_wasm_bindgen::to_value(&MockSource::new().prices(provider)).unwrap_or(JsValue::NULL)
}

/// Fabricated history for one model over the trailing `days` days.
/// Returns {model, provider, prices} or null for an unknown model.
#[wasm_bindgen]
pub fn mock_history(model: &str, provider: &str, days: u32) -> JsValue {
    match MockSource::new().model_history(model, provider, days) {
        Ok(history) => serde_wasm_bindgen::to_value(&history).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Normalized model identifier used for lookups, e.g. "GPT-4 Turbo+"
/// becomes "gpt-4_turbo_".
#[wasm_bindgen]
pub fn normalize_model_name(name: &str) -> String {
    model::normalize_model_name(name)
}

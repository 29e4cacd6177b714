//! In-memory price source with a fixed catalog and synthetic history.
//! Fabricated data is deterministic so reruns and tests see identical
//! tables.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PriceError, Result};
use crate::model::{normalize_model_name, provider_matches, ModelInfo};
use crate::price::{PriceHistory, PricePoint, PriceQuote};
use crate::provider::Provider;
use crate::source::PriceSource;

struct CatalogEntry {
    model: &'static str,
    provider: &'static str,
    input_per_m: f64,
    output_per_m: f64,
    input_change_pct: Option<f64>,
    output_change_pct: Option<f64>,
}

/// Baseline catalog: models, providers, and current prices per 1M tokens.
const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        model: "GPT-4",
        provider: "OpenAI",
        input_per_m: 30.0,
        output_per_m: 60.0,
        input_change_pct: Some(-5.2),
        output_change_pct: Some(2.1),
    },
    CatalogEntry {
        model: "GPT-3.5-Turbo",
        provider: "OpenAI",
        input_per_m: 1.5,
        output_per_m: 2.0,
        input_change_pct: Some(0.0),
        output_change_pct: Some(0.0),
    },
    CatalogEntry {
        model: "Claude-3-Opus",
        provider: "Anthropic",
        input_per_m: 15.0,
        output_per_m: 75.0,
        input_change_pct: Some(3.5),
        output_change_pct: Some(-1.8),
    },
    CatalogEntry {
        model: "Claude-3-Sonnet",
        provider: "Anthropic",
        input_per_m: 3.0,
        output_per_m: 15.0,
        input_change_pct: None,
        output_change_pct: None,
    },
    CatalogEntry {
        model: "Titan Text G1",
        provider: "AWS Bedrock",
        input_per_m: 0.5,
        output_per_m: 0.65,
        input_change_pct: None,
        output_change_pct: None,
    },
];

/// Daily jitter applied to base prices when fabricating history, +/-5%.
const HISTORY_JITTER: f64 = 0.05;

/// In-memory [`PriceSource`] over the built-in catalog.
pub struct MockSource {
    today: NaiveDate,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the end date of fabricated history. Tests use this to keep
    /// timestamps stable.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    fn find_entry(&self, model: &str, provider: &str) -> Option<&'static CatalogEntry> {
        let wanted = normalize_model_name(model);
        CATALOG.iter().find(|e| {
            normalize_model_name(e.model) == wanted && provider_matches(provider, e.provider)
        })
    }

    fn last_updated(&self) -> DateTime<Utc> {
        self.today
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }

    fn quote(&self, entry: &CatalogEntry) -> PriceQuote {
        PriceQuote {
            model: entry.model.to_string(),
            provider: entry.provider.to_string(),
            input_price_per_m: entry.input_per_m,
            output_price_per_m: entry.output_per_m,
            input_change_pct: entry.input_change_pct,
            output_change_pct: entry.output_change_pct,
            last_updated: self.last_updated(),
        }
    }

    // Synchronous accessors. The [`PriceSource`] impl delegates here;
    // the wasm bindings call these directly since nothing suspends.

    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = Vec::new();
        for entry in CATALOG {
            match providers.iter_mut().find(|p| p.name == entry.provider) {
                Some(p) => p.model_count += 1,
                None => providers.push(Provider {
                    name: entry.provider.to_string(),
                    model_count: 1,
                }),
            }
        }
        providers
    }

    pub fn models(&self) -> Vec<ModelInfo> {
        CATALOG
            .iter()
            .map(|e| ModelInfo::new(e.model, e.provider))
            .collect()
    }

    pub fn prices(&self, provider: &str) -> Vec<PriceQuote> {
        CATALOG
            .iter()
            .filter(|e| provider_matches(provider, e.provider))
            .map(|e| self.quote(e))
            .collect()
    }

    pub fn model_history(&self, model: &str, provider: &str, days: u32) -> Result<PriceHistory> {
        let entry = self
            .find_entry(model, provider)
            .ok_or_else(|| PriceError::ModelNotFound(model.to_string()))?;

        let mut points = Vec::with_capacity(days as usize);
        for back in (0..days).rev() {
            let Some(day) = self.today.checked_sub_days(Days::new(back as u64)) else {
                continue;
            };
            let factor = jitter_for(entry.model, entry.provider, day);
            points.push(PricePoint {
                timestamp: day.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc(),
                input_price_per_m: entry.input_per_m * factor,
                output_price_per_m: entry.output_per_m * factor,
            });
        }

        tracing::debug!(model = entry.model, provider = entry.provider, days, "fabricated history");
        Ok(PriceHistory {
            model: entry.model.to_string(),
            provider: entry.provider.to_string(),
            points,
        })
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Multiplier in [1 - jitter, 1 + jitter], seeded from the identifying
/// triple so the same (model, provider, day) always jitters the same way.
fn jitter_for(model: &str, provider: &str, day: NaiveDate) -> f64 {
    let mut hasher = DefaultHasher::new();
    normalize_model_name(model).hash(&mut hasher);
    provider.hash(&mut hasher);
    day.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    1.0 + rng.random_range(-HISTORY_JITTER..HISTORY_JITTER)
}

#[async_trait]
impl PriceSource for MockSource {
    async fn list_providers(&self) -> Result<Vec<Provider>> {
        Ok(self.providers())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self.models())
    }

    async fn list_prices(&self, provider: &str) -> Result<Vec<PriceQuote>> {
        Ok(self.prices(provider))
    }

    async fn history(&self, model: &str, provider: &str, days: u32) -> Result<PriceHistory> {
        self.model_history(model, provider, days)
    }

    async fn refresh(&self) -> Result<()> {
        tracing::debug!("refresh acknowledged (mock data is always current)");
        Ok(())
    }
}

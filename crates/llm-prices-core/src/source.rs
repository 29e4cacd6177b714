use async_trait::async_trait;

use crate::error::Result;
use crate::model::ModelInfo;
use crate::price::{PriceHistory, PriceQuote};
use crate::provider::Provider;

/// Provider selector that returns the union across all providers.
pub const ALL_PROVIDERS: &str = "all";

/// Upstream data collaborator: where providers, models, and prices come
/// from. Implemented by the in-memory mock and by the HTTP client; view
/// code does not care which is behind the trait.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Known providers with their model counts.
    async fn list_providers(&self) -> Result<Vec<Provider>>;

    /// All known models.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Current prices for one provider; [`ALL_PROVIDERS`] for the union.
    async fn list_prices(&self, provider: &str) -> Result<Vec<PriceQuote>>;

    /// Price history for one model at one provider over the trailing
    /// `days` days.
    async fn history(&self, model: &str, provider: &str, days: u32) -> Result<PriceHistory>;

    /// Acknowledge a refresh request. No payload comes back.
    async fn refresh(&self) -> Result<()>;
}

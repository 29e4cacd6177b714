//! HTTP-backed [`PriceSource`] for a deployed pricing service. The wire
//! shapes mirror the service's REST payloads; the mock and this client
//! are interchangeable behind the trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{PriceError, Result};
use crate::model::ModelInfo;
use crate::price::{PriceHistory, PricePoint, PriceQuote};
use crate::provider::Provider;
use crate::source::{PriceSource, ALL_PROVIDERS};

pub struct ApiSource {
    http: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    display_name: String,
    provider: String,
}

#[derive(Debug, Deserialize)]
struct ApiHistory {
    model: String,
    provider: String,
    prices: Vec<ApiHistoryPoint>,
}

#[derive(Debug, Deserialize)]
struct ApiHistoryPoint {
    timestamp: DateTime<Utc>,
    input_price_per_1m: f64,
    output_price_per_1m: f64,
}

impl ApiSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("failed to build HTTP client"),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Api { status, body });
        }
        Ok(resp.json().await?)
    }

    async fn models(&self) -> Result<Vec<ApiModel>> {
        self.get_json("/models").await
    }
}

#[async_trait]
impl PriceSource for ApiSource {
    /// The service exposes no provider endpoint; the list is derived by
    /// grouping `/models` rows per provider.
    async fn list_providers(&self) -> Result<Vec<Provider>> {
        let models = self.models().await?;
        let mut providers: Vec<Provider> = Vec::new();
        for m in models {
            match providers.iter_mut().find(|p| p.name == m.provider) {
                Some(p) => p.model_count += 1,
                None => providers.push(Provider {
                    name: m.provider,
                    model_count: 1,
                }),
            }
        }
        Ok(providers)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self
            .models()
            .await?
            .into_iter()
            .map(|m| ModelInfo {
                display_name: m.display_name,
                provider: m.provider,
            })
            .collect())
    }

    async fn list_prices(&self, provider: &str) -> Result<Vec<PriceQuote>> {
        if provider.eq_ignore_ascii_case(ALL_PROVIDERS) {
            self.get_json("/prices").await
        } else {
            self.get_json(&format!("/prices/{}", urlencoding::encode(provider)))
                .await
        }
    }

    async fn history(&self, model: &str, provider: &str, days: u32) -> Result<PriceHistory> {
        let url = format!(
            "{}/prices/history/{}?provider={}&days={days}",
            self.base,
            urlencoding::encode(model),
            urlencoding::encode(provider),
        );
        let resp = self.http.get(&url).send().await?;
        let status = resp.status().as_u16();
        if status == 404 {
            return Err(PriceError::ModelNotFound(model.to_string()));
        }
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Api { status, body });
        }

        let mut histories: Vec<ApiHistory> = resp.json().await?;
        // One entry per provider serving the model; pick the requested one.
        let position = histories
            .iter()
            .position(|h| h.provider.eq_ignore_ascii_case(provider))
            .or_else(|| (!histories.is_empty()).then_some(0))
            .ok_or_else(|| PriceError::ModelNotFound(model.to_string()))?;
        let chosen = histories.swap_remove(position);

        Ok(PriceHistory {
            model: chosen.model,
            provider: chosen.provider,
            points: chosen
                .prices
                .into_iter()
                .map(|p| PricePoint {
                    timestamp: p.timestamp,
                    input_price_per_m: p.input_price_per_1m,
                    output_price_per_m: p.output_price_per_1m,
                })
                .collect(),
        })
    }

    async fn refresh(&self) -> Result<()> {
        let url = format!("{}/refresh", self.base);
        let resp = self.http.post(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Api { status, body });
        }
        Ok(())
    }
}

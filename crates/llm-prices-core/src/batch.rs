//! Settle-all history fan-out. N concurrent requests, one tagged result
//! per request: a failing model dims one line in the view instead of
//! blanking the whole chart.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::PriceError;
use crate::model::ModelInfo;
use crate::price::PriceHistory;
use crate::source::PriceSource;

/// One requested (model, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTarget {
    pub model: String,
    pub provider: String,
}

impl From<&ModelInfo> for HistoryTarget {
    fn from(m: &ModelInfo) -> Self {
        Self {
            model: m.display_name.clone(),
            provider: m.provider.clone(),
        }
    }
}

/// Per-target outcome of the fan-out.
#[derive(Debug)]
pub struct HistoryOutcome {
    pub model: String,
    pub provider: String,
    pub result: Result<PriceHistory, PriceError>,
}

impl HistoryOutcome {
    pub fn ok(&self) -> Option<&PriceHistory> {
        self.result.as_ref().ok()
    }
}

/// Fetch history for every target concurrently and settle each request
/// independently. Outcomes come back in target order regardless of
/// completion order; no outcome is dropped.
pub async fn fetch_histories(
    source: Arc<dyn PriceSource>,
    targets: &[HistoryTarget],
    days: u32,
) -> Vec<HistoryOutcome> {
    let mut set = JoinSet::new();
    for (index, target) in targets.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        set.spawn(async move {
            let result = source.history(&target.model, &target.provider, days).await;
            (index, target, result)
        });
    }

    let mut outcomes: Vec<Option<HistoryOutcome>> = Vec::new();
    outcomes.resize_with(targets.len(), || None);

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, target, result)) => {
                if let Err(ref e) = result {
                    tracing::warn!(model = %target.model, provider = %target.provider, error = %e, "history fetch failed");
                }
                outcomes[index] = Some(HistoryOutcome {
                    model: target.model,
                    provider: target.provider,
                    result,
                });
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "history task aborted");
            }
        }
    }

    // A panicked task leaves a hole; report it rather than dropping it.
    outcomes
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| HistoryOutcome {
                model: targets[index].model.clone(),
                provider: targets[index].provider.clone(),
                result: Err(PriceError::Other("history task aborted".to_string())),
            })
        })
        .collect()
}

/// Split outcomes into successful histories and (model, error) failures,
/// both in target order.
pub fn settle(outcomes: Vec<HistoryOutcome>) -> (Vec<PriceHistory>, Vec<(String, PriceError)>) {
    let mut histories = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(history) => histories.push(history),
            Err(e) => failures.push((outcome.model, e)),
        }
    }
    (histories, failures)
}

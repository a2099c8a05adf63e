//! Best-effort input cost estimation.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{default_lookup, PriceLookup, Usage};
use crate::provider::Provider;
use crate::types::CostEstimate;

/// Estimates the input-token cost of a count.
///
/// Never fails: an unmapped provider, a missing price source or any lookup
/// error yields `None`, and the count itself is unaffected.
#[derive(Clone)]
pub struct CostEstimator {
    lookup: Option<Arc<dyn PriceLookup>>,
}

impl CostEstimator {
    pub fn new(lookup: Option<Arc<dyn PriceLookup>>) -> Self {
        Self { lookup }
    }

    /// Estimator over the bundled catalog (absent without the `pricing` feature).
    pub fn bundled() -> Self {
        Self::new(default_lookup())
    }

    pub fn is_available(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn estimate(&self, tokens: u64, provider: Provider, model: &str) -> Option<CostEstimate> {
        let Some(lookup) = self.lookup.as_ref() else {
            debug!(%provider, model, "no price source available, skipping cost estimate");
            return None;
        };
        let Some(provider_id) = provider.pricing_provider_id() else {
            debug!(%provider, "provider has no pricing id, skipping cost estimate");
            return None;
        };

        match lookup.calc_price(Usage::input_only(tokens), model, provider_id) {
            Ok(price) if price.total_price.is_finite() && price.total_price >= 0.0 => {
                Some(CostEstimate {
                    estimated_cost: price.total_price,
                    matched_model: price.model_id,
                })
            }
            Ok(price) => {
                debug!(
                    %provider,
                    model,
                    total_price = price.total_price,
                    "discarding invalid price"
                );
                None
            }
            Err(e) => {
                debug!(%provider, model, error = %e, "cost estimation unavailable");
                None
            }
        }
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::bundled()
    }
}

impl fmt::Debug for CostEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostEstimator")
            .field("available", &self.is_available())
            .finish()
    }
}

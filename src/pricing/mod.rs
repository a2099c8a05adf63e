//! 价格估算模块：按模型匹配价格表，计算输入 Token 成本
//!
//! # Pricing and Cost Estimation Module
//!
//! Maps `(provider, model, token count)` to a USD price.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PriceLookup`] | Trait for price sources, injectable into the counter |
//! | `PriceCatalog` | Bundled YAML price table with model match rules (`pricing` feature) |
//! | [`CostEstimator`] | Best-effort input-only estimation used by [`crate::TokenCounter`] |
//!
//! Only input tokens are priced during counting; output is unknown until a
//! model has generated it.

#[cfg(feature = "pricing")]
mod catalog;
mod estimator;

#[cfg(feature = "pricing")]
pub use catalog::{
    bundled_catalog, MatchRule, ModelPrice, ModelPrices, MtokPrice, PriceCatalog, PriceTier,
    ProviderPrices,
};
pub use estimator::CostEstimator;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token usage to price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn input_only(input_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens: 0,
        }
    }
}

/// Result of a successful price lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculation {
    pub input_price: f64,
    pub output_price: f64,
    pub total_price: f64,
    /// Catalog model the reference matched (may differ from the reference,
    /// e.g. a dated snapshot resolving to its family id).
    pub model_id: String,
    pub provider_id: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("unknown pricing provider: {0}")]
    UnknownProvider(String),

    #[error("no price found for model '{model_ref}' (provider {provider_id})")]
    UnknownModel {
        model_ref: String,
        provider_id: String,
    },

    #[error("price catalog unavailable: {0}")]
    Catalog(String),
}

/// A source of model prices.
pub trait PriceLookup: Send + Sync {
    fn calc_price(
        &self,
        usage: Usage,
        model_ref: &str,
        provider_id: &str,
    ) -> Result<PriceCalculation, PricingError>;
}

impl<T: PriceLookup + ?Sized> PriceLookup for Arc<T> {
    fn calc_price(
        &self,
        usage: Usage,
        model_ref: &str,
        provider_id: &str,
    ) -> Result<PriceCalculation, PricingError> {
        (**self).calc_price(usage, model_ref, provider_id)
    }
}

/// Price source backed by the bundled catalog.
///
/// A catalog that fails to load surfaces as [`PricingError::Catalog`] on
/// every call rather than at construction.
#[cfg(feature = "pricing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledPrices;

#[cfg(feature = "pricing")]
impl PriceLookup for BundledPrices {
    fn calc_price(
        &self,
        usage: Usage,
        model_ref: &str,
        provider_id: &str,
    ) -> Result<PriceCalculation, PricingError> {
        bundled_catalog()?.calc_price(usage, model_ref, provider_id)
    }
}

/// The price source used when none is injected, if pricing is compiled in.
pub fn default_lookup() -> Option<Arc<dyn PriceLookup>> {
    #[cfg(feature = "pricing")]
    {
        Some(Arc::new(BundledPrices))
    }
    #[cfg(not(feature = "pricing"))]
    {
        None
    }
}

//! Bundled price catalog.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{PriceCalculation, PriceLookup, PricingError, Usage};

const BUNDLED_PRICES: &str = include_str!("../../data/prices.yaml");

static BUNDLED: Lazy<Result<PriceCatalog, String>> = Lazy::new(|| {
    let catalog = PriceCatalog::from_yaml(BUNDLED_PRICES).map_err(|e| e.to_string());
    match &catalog {
        Ok(c) => tracing::debug!(
            providers = c.providers.len(),
            updated = c.updated.as_deref().unwrap_or("unknown"),
            "loaded bundled price catalog"
        ),
        Err(e) => tracing::warn!(error = %e, "bundled price catalog failed to parse"),
    }
    catalog
});

/// The catalog shipped with the crate, parsed once per process.
///
/// ```rust
/// use token_check::pricing::{bundled_catalog, PriceLookup, Usage};
///
/// let catalog = bundled_catalog().unwrap();
/// let price = catalog
///     .calc_price(Usage::input_only(1_000_000), "gpt-4o-2024-08-06", "openai")
///     .unwrap();
/// assert_eq!(price.model_id, "gpt-4o");
/// assert!((price.total_price - 2.5).abs() < 1e-9);
/// ```
pub fn bundled_catalog() -> Result<&'static PriceCatalog, PricingError> {
    match &*BUNDLED {
        Ok(catalog) => Ok(catalog),
        Err(e) => Err(PricingError::Catalog(e.clone())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCatalog {
    #[serde(default)]
    pub updated: Option<String>,
    pub providers: Vec<ProviderPrices>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPrices {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub models: Vec<ModelPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub id: String,
    #[serde(rename = "match")]
    pub matcher: MatchRule,
    pub prices: ModelPrices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrices {
    pub input_mtok: MtokPrice,
    #[serde(default)]
    pub output_mtok: Option<MtokPrice>,
}

/// Rule deciding whether a model reference belongs to a catalog entry.
///
/// Comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchRule {
    Equals { equals: String },
    StartsWith { starts_with: String },
    Contains { contains: String },
    Or { or: Vec<MatchRule> },
}

impl MatchRule {
    pub fn is_match(&self, model_ref: &str) -> bool {
        match self {
            MatchRule::Equals { equals } => model_ref == equals.to_lowercase(),
            MatchRule::StartsWith { starts_with } => {
                model_ref.starts_with(&starts_with.to_lowercase())
            }
            MatchRule::Contains { contains } => model_ref.contains(&contains.to_lowercase()),
            MatchRule::Or { or } => or.iter().any(|rule| rule.is_match(model_ref)),
        }
    }
}

/// Price in USD per million tokens, flat or tiered by prompt size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MtokPrice {
    Flat(f64),
    Tiered { base: f64, tiers: Vec<PriceTier> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub start: u64,
    pub price: f64,
}

impl MtokPrice {
    /// Per-million rate that applies when the prompt has `input_tokens` tokens.
    pub fn rate(&self, input_tokens: u64) -> f64 {
        match self {
            MtokPrice::Flat(p) => *p,
            MtokPrice::Tiered { base, tiers } => tiers
                .iter()
                .filter(|t| input_tokens > t.start)
                .max_by_key(|t| t.start)
                .map(|t| t.price)
                .unwrap_or(*base),
        }
    }

    fn price(&self, tokens: u64, input_tokens: u64) -> f64 {
        tokens as f64 * self.rate(input_tokens) / 1_000_000.0
    }
}

impl PriceCatalog {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn provider(&self, provider_id: &str) -> Option<&ProviderPrices> {
        self.providers
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(provider_id))
    }

    /// First catalog model under `provider_id` matching `model_ref`.
    pub fn find_model(&self, provider_id: &str, model_ref: &str) -> Result<&ModelPrice, PricingError> {
        let provider = self
            .provider(provider_id)
            .ok_or_else(|| PricingError::UnknownProvider(provider_id.to_string()))?;
        let needle = normalize_model_ref(model_ref);
        provider
            .models
            .iter()
            .find(|m| m.matcher.is_match(&needle))
            .ok_or_else(|| PricingError::UnknownModel {
                model_ref: model_ref.to_string(),
                provider_id: provider.id.clone(),
            })
    }
}

impl PriceLookup for PriceCatalog {
    fn calc_price(
        &self,
        usage: Usage,
        model_ref: &str,
        provider_id: &str,
    ) -> Result<PriceCalculation, PricingError> {
        let model = self.find_model(provider_id, model_ref)?;
        let input_price = model
            .prices
            .input_mtok
            .price(usage.input_tokens, usage.input_tokens);
        let output_price = model
            .prices
            .output_mtok
            .as_ref()
            .map(|p| p.price(usage.output_tokens, usage.input_tokens))
            .unwrap_or(0.0);

        Ok(PriceCalculation {
            input_price,
            output_price,
            total_price: input_price + output_price,
            model_id: model.id.clone(),
            provider_id: provider_id.to_lowercase(),
        })
    }
}

/// Lowercase and drop routing prefixes such as `models/` or `openai/`.
fn normalize_model_ref(model_ref: &str) -> String {
    let trimmed = model_ref.trim();
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.to_lowercase()
}

use std::sync::Arc;

use crate::config::CounterConfig;
use crate::counter::TokenCounter;
use crate::pricing::{CostEstimator, PriceLookup};

/// Builder for [`TokenCounter`].
///
/// Every field is optional; a default-built counter counts OpenAI models
/// offline and prices them from the bundled catalog.
#[derive(Debug, Default)]
pub struct TokenCounterBuilder {
    config: CounterConfig,
    estimator: Option<CostEstimator>,
}

impl TokenCounterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. [`CounterConfig::from_env`].
    pub fn from_config(config: CounterConfig) -> Self {
        Self {
            config,
            estimator: None,
        }
    }

    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.anthropic_api_key = Some(key.into());
        self
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn gemini_project_id(mut self, project: impl Into<String>) -> Self {
        self.config.gemini_project_id = Some(project.into());
        self
    }

    /// GCP location for Vertex AI (defaults to `us-central1`).
    pub fn gemini_location(mut self, location: impl Into<String>) -> Self {
        self.config.gemini_location = location.into();
        self
    }

    /// Route Gemini counting through Vertex AI instead of the Gemini API.
    pub fn use_vertex_ai(mut self, enable: bool) -> Self {
        self.config.use_vertex_ai = enable;
        self
    }

    /// OAuth access token for Vertex AI, obtained by the caller.
    pub fn vertex_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.vertex_access_token = Some(token.into());
        self
    }

    /// Override the Anthropic API base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn anthropic_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.anthropic_base_url = Some(base_url.into());
        self
    }

    /// Override the Gemini API base URL.
    pub fn gemini_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.gemini_base_url = Some(base_url.into());
        self
    }

    /// Override the Vertex AI base URL (normally derived from the location).
    pub fn vertex_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.vertex_base_url = Some(base_url.into());
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.timeout_secs = secs.max(1);
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.http.proxy_url = Some(url.into());
        self
    }

    /// Price counts with a custom source instead of the bundled catalog.
    pub fn price_lookup(mut self, lookup: Arc<dyn PriceLookup>) -> Self {
        self.estimator = Some(CostEstimator::new(Some(lookup)));
        self
    }

    /// Disable cost estimation; requested costs are always absent.
    pub fn without_pricing(mut self) -> Self {
        self.estimator = Some(CostEstimator::new(None));
        self
    }

    pub fn build(self) -> TokenCounter {
        let estimator = self.estimator.unwrap_or_else(CostEstimator::bundled);
        TokenCounter::from_parts(self.config, estimator)
    }
}

//! Token counting facade.

mod builder;

pub use builder::TokenCounterBuilder;

use tracing::debug;

use crate::config::CounterConfig;
use crate::drivers::{AnthropicDriver, GeminiDriver, TiktokenDriver};
use crate::error::{Error, ErrorContext};
use crate::pricing::CostEstimator;
use crate::provider::Provider;
use crate::types::TokenCountResult;
use crate::Result;

/// Unified token counter for OpenAI, Anthropic and Gemini models.
///
/// OpenAI counts are computed locally and need no configuration. Anthropic
/// and Gemini counts are one blocking HTTP call each, using credentials set
/// at construction. Calls run to completion on the caller's thread; timeouts
/// beyond the HTTP client's own and retries are left to the caller.
#[derive(Debug)]
pub struct TokenCounter {
    config: CounterConfig,
    openai: TiktokenDriver,
    anthropic: AnthropicDriver,
    gemini: GeminiDriver,
    estimator: CostEstimator,
}

impl TokenCounter {
    /// Counter with default configuration (offline OpenAI counting only).
    pub fn new() -> Self {
        TokenCounterBuilder::new().build()
    }

    /// Counter configured from the environment, see [`CounterConfig::from_env`].
    pub fn from_env() -> Self {
        TokenCounterBuilder::from_config(CounterConfig::from_env()).build()
    }

    pub fn builder() -> TokenCounterBuilder {
        TokenCounterBuilder::new()
    }

    pub(crate) fn from_parts(config: CounterConfig, estimator: CostEstimator) -> Self {
        Self {
            openai: TiktokenDriver::new(),
            anthropic: AnthropicDriver::new(&config),
            gemini: GeminiDriver::new(&config),
            estimator,
            config,
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Count tokens in `text` for `model` on `provider`.
    ///
    /// With `estimate_cost`, the input-token cost is looked up afterwards;
    /// a failed lookup leaves the cost absent and never fails the count.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `text` is empty or whitespace only (checked
    ///   before anything else).
    /// - `MissingCredential` if the provider needs an API key, project or
    ///   Vertex setting that was not configured.
    /// - `DependencyMissing` if the provider's backend was compiled out.
    /// - `Transport` / `Remote` for network failures and error replies,
    ///   passed through without retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use token_check::{Provider, TokenCounter};
    ///
    /// let counter = TokenCounter::new();
    /// let result = counter
    ///     .count_tokens("Hello, world!", Provider::OpenAi, "gpt-4o", false)
    ///     .unwrap();
    /// assert_eq!(result.tokens, 4);
    /// assert!(result.estimated_cost().is_none());
    /// ```
    pub fn count_tokens(
        &self,
        text: &str,
        provider: Provider,
        model: &str,
        estimate_cost: bool,
    ) -> Result<TokenCountResult> {
        ensure_text(text)?;

        debug!(%provider, model, chars = text.chars().count(), "counting tokens");
        let tokens = match provider {
            Provider::OpenAi => self.openai.count(text, model)?,
            Provider::Anthropic => self.anthropic.count(text, model)?,
            Provider::Gemini => self.gemini.count(text, model)?,
        };

        if !estimate_cost {
            return Ok(TokenCountResult::new(tokens));
        }
        let cost = self.estimator.estimate(tokens, provider, model);
        Ok(TokenCountResult::with_cost(tokens, cost))
    }

    /// Like [`count_tokens`](Self::count_tokens), with the provider given by name.
    ///
    /// The text is validated first, then the name; an unknown name fails with
    /// `InvalidArgument`.
    pub fn count_tokens_for(
        &self,
        text: &str,
        provider: &str,
        model: &str,
        estimate_cost: bool,
    ) -> Result<TokenCountResult> {
        ensure_text(text)?;
        let provider: Provider = provider.parse()?;
        self.count_tokens(text, provider, model, estimate_cost)
    }

    /// Encoding an OpenAI model name resolves to locally.
    pub fn openai_encoding(&self, model: &str) -> Result<&'static str> {
        self.openai.encoding_for(model)
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::invalid_argument(
            "Input text cannot be empty",
            ErrorContext::new()
                .with_field_path("text")
                .with_source("counter"),
        ));
    }
    Ok(())
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

//! Supported providers and their pricing identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorContext};

/// Provider name mapping into the pricing catalog.
///
/// The catalog groups Gemini models under Google's provider id.
const PROVIDER_MAPPING: &[(Provider, &str)] = &[
    (Provider::OpenAi, "openai"),
    (Provider::Anthropic, "anthropic"),
    (Provider::Gemini, "google"),
];

/// One of the three supported LLM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Counted locally with tiktoken, no API key needed.
    #[serde(rename = "openai")]
    OpenAi,
    /// Counted by the Messages `count_tokens` endpoint.
    Anthropic,
    /// Counted by the `countTokens` endpoint (direct API or Vertex AI).
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    /// Whether counting for this provider goes over the network.
    pub fn requires_network(&self) -> bool {
        !matches!(self, Provider::OpenAi)
    }

    pub fn pricing_provider_id(&self) -> Option<&'static str> {
        PROVIDER_MAPPING
            .iter()
            .find(|(p, _)| p == self)
            .map(|(_, id)| *id)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" => Ok(Provider::Gemini),
            other => Err(Error::invalid_argument(
                format!("Unsupported provider: {}", other),
                ErrorContext::new()
                    .with_field_path("provider")
                    .with_details("expected one of: openai, anthropic, gemini"),
            )),
        }
    }
}

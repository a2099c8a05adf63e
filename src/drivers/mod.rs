//! 计数驱动层：按 Provider 分派到本地分词器或远程计数接口
//!
//! Counting drivers. Each supported provider has exactly one concrete driver:
//!
//! | Driver | Provider | Strategy |
//! |--------|----------|----------|
//! | [`TiktokenDriver`] | OpenAI | local BPE encoding, offline |
//! | [`AnthropicDriver`] | Anthropic | `POST /v1/messages/count_tokens` |
//! | [`GeminiDriver`] | Gemini | `POST .../models/{model}:countTokens` (direct API or Vertex AI) |
//!
//! The set is closed: [`crate::TokenCounter`] matches on [`crate::Provider`]
//! instead of looking drivers up in a registry. Remote drivers build their
//! HTTP client on first use and keep it for the life of the counter.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use serde_json::Value;

use crate::error::Error;

pub use anthropic::AnthropicDriver;
pub use gemini::GeminiDriver;
pub use openai::TiktokenDriver;

/// HTTP request produced by a remote driver before it is sent.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Fully resolved endpoint URL.
    pub url: String,
    /// Extra request headers (content type is set by the transport).
    pub headers: Vec<(String, String)>,
    /// Bearer token, if the endpoint authenticates that way.
    pub bearer: Option<String>,
    /// JSON request body.
    pub body: Value,
}

impl DriverRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Error for a driver whose backing library was compiled out.
#[cfg(not(all(feature = "openai", feature = "anthropic", feature = "gemini")))]
pub(crate) fn feature_disabled(dependency: &str, feature: &str, source: &str) -> Error {
    Error::dependency_missing(
        dependency,
        format!("rebuild with the `{}` feature enabled", feature),
        crate::error::ErrorContext::new().with_source(source),
    )
}

/// Read a non-negative integer count out of a provider response.
pub(crate) fn read_count(body: &Value, field: &str, source: &str) -> crate::Result<u64> {
    body.get(field).and_then(Value::as_u64).ok_or_else(|| {
        Error::from(crate::transport::TransportError::InvalidResponse(format!(
            "{}: missing or non-integer `{}` in response",
            source, field
        )))
    })
}

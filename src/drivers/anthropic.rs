//! Anthropic Messages 计数驱动
//!
//! Anthropic token counting through the Messages API. Key points:
//! - Endpoint is `POST /v1/messages/count_tokens`, it does not create a message.
//! - Auth uses the `x-api-key` header plus a pinned `anthropic-version`.
//! - The text travels as the content of a single `user` message.
//! - The reply's `input_tokens` is returned verbatim.
//! - The API key is checked before anything else, so a missing key is
//!   reported even when the HTTP backend is compiled out.

#[cfg(feature = "anthropic")]
use once_cell::sync::OnceCell;
use serde_json::{json, Value};

use crate::config::CounterConfig;
#[cfg(feature = "anthropic")]
use crate::config::HttpSettings;
use crate::error::{Error, ErrorContext};
#[cfg(feature = "anthropic")]
use crate::transport::HttpTransport;
use crate::Result;

use super::{read_count, DriverRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const COUNT_TOKENS_PATH: &str = "/v1/messages/count_tokens";

/// Remote counting driver for Claude models.
pub struct AnthropicDriver {
    api_key: Option<String>,
    base_url: String,
    #[cfg(feature = "anthropic")]
    http: HttpSettings,
    #[cfg(feature = "anthropic")]
    client: OnceCell<HttpTransport>,
}

impl AnthropicDriver {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            api_key: config.anthropic_api_key().map(String::from),
            base_url: config
                .anthropic_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            #[cfg(feature = "anthropic")]
            http: config.http.clone(),
            #[cfg(feature = "anthropic")]
            client: OnceCell::new(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::missing_credential(
                "Anthropic API key is required for token counting",
                ErrorContext::new()
                    .with_field_path("anthropic_api_key")
                    .with_details("provide anthropic_api_key or set the ANTHROPIC_API_KEY environment variable")
                    .with_source("anthropic_driver"),
            )
        })
    }

    /// Build the `count_tokens` request for `text` against `model`.
    pub fn build_request(&self, text: &str, model: &str) -> Result<DriverRequest> {
        let api_key = self.api_key()?;
        Ok(DriverRequest {
            url: format!("{}{}", self.base_url.trim_end_matches('/'), COUNT_TOKENS_PATH),
            headers: vec![
                ("x-api-key".to_string(), api_key.to_string()),
                ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
            ],
            bearer: None,
            body: json!({
                "model": model,
                "messages": [{ "role": "user", "content": text }],
            }),
        })
    }

    /// Anthropic: `{ "input_tokens": 14 }`
    pub fn parse_response(body: &Value) -> Result<u64> {
        read_count(body, "input_tokens", "anthropic")
    }

    pub fn count(&self, text: &str, model: &str) -> Result<u64> {
        let request = self.build_request(text, model)?;

        #[cfg(feature = "anthropic")]
        {
            let client = self.client()?;
            tracing::debug!(model, url = %request.url, "anthropic count_tokens");
            let body = client.post_json(
                &request.url,
                &request.headers,
                request.bearer.as_deref(),
                &request.body,
            )?;
            Self::parse_response(&body)
        }
        #[cfg(not(feature = "anthropic"))]
        {
            let _ = request;
            Err(super::feature_disabled("reqwest", "anthropic", "anthropic_driver"))
        }
    }

    #[cfg(feature = "anthropic")]
    fn client(&self) -> Result<&HttpTransport> {
        self.client.get_or_try_init(|| HttpTransport::new(&self.http))
    }

    /// Whether the HTTP client has been built yet.
    pub fn is_connected(&self) -> bool {
        #[cfg(feature = "anthropic")]
        {
            self.client.get().is_some()
        }
        #[cfg(not(feature = "anthropic"))]
        {
            false
        }
    }
}

impl std::fmt::Debug for AnthropicDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicDriver")
            .field("has_api_key", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn driver(key: Option<&str>) -> AnthropicDriver {
        AnthropicDriver::new(&CounterConfig {
            anthropic_api_key: key.map(String::from),
            ..Default::default()
        })
    }

    #[test]
    fn test_build_request() {
        let req = driver(Some("sk-ant-test"))
            .build_request("Hello, Claude", "claude-sonnet-4-20250514")
            .unwrap();
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages/count_tokens");
        assert_eq!(req.header("x-api-key"), Some("sk-ant-test"));
        assert_eq!(req.header("anthropic-version"), Some("2023-06-01"));
        assert_eq!(req.body["model"], "claude-sonnet-4-20250514");
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(req.body["messages"][0]["role"], "user");
        assert_eq!(req.body["messages"][0]["content"], "Hello, Claude");
    }

    #[test]
    fn test_base_url_override() {
        let d = AnthropicDriver::new(&CounterConfig {
            anthropic_api_key: Some("k".into()),
            anthropic_base_url: Some("http://127.0.0.1:9999/".into()),
            ..Default::default()
        });
        let req = d.build_request("x", "claude-3-haiku-20240307").unwrap();
        assert_eq!(req.url, "http://127.0.0.1:9999/v1/messages/count_tokens");
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn test_missing_key_never_builds_client() {
        let d = driver(None);
        let err = d.count("Hello", "claude-3-5-haiku-latest").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert!(!d.is_connected());

        let err = driver(Some("")).count("Hello", "claude-3-5-haiku-latest").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
    }

    #[cfg(not(feature = "anthropic"))]
    #[test]
    fn test_backend_compiled_out() {
        // The key is still checked first.
        let err = driver(None).count("Hello", "claude-3-5-haiku-latest").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);

        let d = driver(Some("sk-ant-test"));
        let err = d.count("Hello", "claude-3-5-haiku-latest").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyMissing);
        assert!(err.to_string().contains("anthropic"));
        assert!(!d.is_connected());
    }

    #[test]
    fn test_parse_response() {
        let body = serde_json::json!({ "input_tokens": 14 });
        assert_eq!(AnthropicDriver::parse_response(&body).unwrap(), 14);

        let body = serde_json::json!({ "usage": { "input_tokens": 14 } });
        let err = AnthropicDriver::parse_response(&body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}

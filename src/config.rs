//! Construction-time configuration for [`crate::TokenCounter`].
//!
//! Configuration is fixed once a counter is built. Values can be set through
//! [`crate::TokenCounterBuilder`] or read from the environment with
//! [`CounterConfig::from_env`]:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ANTHROPIC_API_KEY` | `anthropic_api_key` |
//! | `GOOGLE_API_KEY`, then `GEMINI_API_KEY` | `gemini_api_key` |
//! | `GOOGLE_CLOUD_PROJECT` | `gemini_project_id` |
//! | `GOOGLE_CLOUD_LOCATION` | `gemini_location` |
//! | `GOOGLE_GENAI_USE_VERTEXAI` | `use_vertex_ai` |
//! | `GOOGLE_ACCESS_TOKEN` | `vertex_access_token` |
//! | `ANTHROPIC_BASE_URL` | `anthropic_base_url` |
//! | `GEMINI_BASE_URL` | `gemini_base_url` |
//! | `TOKEN_CHECK_HTTP_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `TOKEN_CHECK_PROXY_URL` | `http.proxy_url` |

use std::env;
use std::fmt;

pub const DEFAULT_GEMINI_LOCATION: &str = "us-central1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// HTTP client settings for the remote drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            proxy_url: None,
        }
    }
}

#[derive(Clone)]
pub struct CounterConfig {
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_project_id: Option<String>,
    pub gemini_location: String,
    pub use_vertex_ai: bool,
    /// Pre-obtained OAuth token sent as a bearer token in Vertex mode.
    pub vertex_access_token: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub vertex_base_url: Option<String>,
    pub http: HttpSettings,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            gemini_api_key: None,
            gemini_project_id: None,
            gemini_location: DEFAULT_GEMINI_LOCATION.to_string(),
            use_vertex_ai: false,
            vertex_access_token: None,
            anthropic_base_url: None,
            gemini_base_url: None,
            vertex_base_url: None,
            http: HttpSettings::default(),
        }
    }
}

impl CounterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_empty(lookup(key));

        let timeout_secs = get("TOKEN_CHECK_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            // GOOGLE_API_KEY takes precedence over GEMINI_API_KEY.
            gemini_api_key: get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY")),
            gemini_project_id: get("GOOGLE_CLOUD_PROJECT"),
            gemini_location: get("GOOGLE_CLOUD_LOCATION")
                .unwrap_or_else(|| DEFAULT_GEMINI_LOCATION.to_string()),
            use_vertex_ai: get("GOOGLE_GENAI_USE_VERTEXAI")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            vertex_access_token: get("GOOGLE_ACCESS_TOKEN"),
            anthropic_base_url: get("ANTHROPIC_BASE_URL"),
            gemini_base_url: get("GEMINI_BASE_URL"),
            vertex_base_url: None,
            http: HttpSettings {
                timeout_secs,
                proxy_url: get("TOKEN_CHECK_PROXY_URL"),
            },
        }
    }

    pub(crate) fn anthropic_api_key(&self) -> Option<&str> {
        non_empty_ref(self.anthropic_api_key.as_deref())
    }

    pub(crate) fn gemini_api_key(&self) -> Option<&str> {
        non_empty_ref(self.gemini_api_key.as_deref())
    }

    pub(crate) fn gemini_project_id(&self) -> Option<&str> {
        non_empty_ref(self.gemini_project_id.as_deref())
    }

    pub(crate) fn gemini_location(&self) -> &str {
        non_empty_ref(Some(self.gemini_location.as_str())).unwrap_or(DEFAULT_GEMINI_LOCATION)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_empty_ref(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn redact(value: &Option<String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "<redacted>",
        _ => "<unset>",
    }
}

impl fmt::Debug for CounterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterConfig")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_project_id", &self.gemini_project_id)
            .field("gemini_location", &self.gemini_location)
            .field("use_vertex_ai", &self.use_vertex_ai)
            .field("vertex_access_token", &redact(&self.vertex_access_token))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("vertex_base_url", &self.vertex_base_url)
            .field("http", &self.http)
            .finish()
    }
}

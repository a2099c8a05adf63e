//! Gemini countTokens 驱动
//!
//! Google Gemini token counting. Two routes share the same request body:
//! - Direct Gemini API: `POST {base}/v1beta/models/{model}:countTokens`,
//!   API key in the `x-goog-api-key` header.
//! - Vertex AI: `POST https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:countTokens`,
//!   authenticated with a caller-supplied bearer token.
//!
//! The body is `{"contents": [{"role": "user", "parts": [{"text": ...}]}]}` and
//! the reply's `totalTokens` is returned verbatim.

#[cfg(feature = "gemini")]
use once_cell::sync::OnceCell;
use serde_json::{json, Value};

use crate::config::CounterConfig;
#[cfg(feature = "gemini")]
use crate::config::HttpSettings;
use crate::error::{Error, ErrorContext};
#[cfg(feature = "gemini")]
use crate::transport::HttpTransport;
use crate::Result;

use super::{read_count, DriverRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// The Gemini and Vertex part of a [`CounterConfig`], with empty values
/// already treated as unset.
#[derive(Clone, PartialEq, Eq)]
struct GeminiSettings {
    api_key: Option<String>,
    project_id: Option<String>,
    location: String,
    use_vertex_ai: bool,
    access_token: Option<String>,
    base_url: Option<String>,
    vertex_base_url: Option<String>,
}

impl GeminiSettings {
    fn from_config(config: &CounterConfig) -> Self {
        Self {
            api_key: config.gemini_api_key().map(String::from),
            project_id: config.gemini_project_id().map(String::from),
            location: config.gemini_location().to_string(),
            use_vertex_ai: config.use_vertex_ai,
            access_token: config.vertex_access_token.clone().filter(|t| !t.is_empty()),
            base_url: config.gemini_base_url.clone(),
            vertex_base_url: config.vertex_base_url.clone(),
        }
    }
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("has_api_key", &self.api_key.is_some())
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("use_vertex_ai", &self.use_vertex_ai)
            .field("has_access_token", &self.access_token.is_some())
            .field("base_url", &self.base_url)
            .field("vertex_base_url", &self.vertex_base_url)
            .finish()
    }
}

/// Where Gemini requests are routed, fixed when the client is built.
#[derive(Clone, PartialEq, Eq)]
pub enum GeminiEndpoint {
    Direct {
        api_key: String,
        base_url: String,
    },
    Vertex {
        project: String,
        location: String,
        base_url: String,
        access_token: Option<String>,
    },
}

impl GeminiEndpoint {
    /// Pick the route from configuration, checking the credentials it needs.
    pub fn from_config(config: &CounterConfig) -> Result<Self> {
        Self::from_settings(&GeminiSettings::from_config(config))
    }

    fn from_settings(settings: &GeminiSettings) -> Result<Self> {
        if settings.use_vertex_ai {
            let project = settings.project_id.as_deref().ok_or_else(|| {
                Error::missing_credential(
                    "gemini_project_id is required when use_vertex_ai is enabled",
                    ErrorContext::new()
                        .with_field_path("gemini_project_id")
                        .with_details("set gemini_project_id or the GOOGLE_CLOUD_PROJECT environment variable")
                        .with_source("gemini_driver"),
                )
            })?;
            let location = settings.location.clone();
            let base_url = settings
                .vertex_base_url
                .clone()
                .unwrap_or_else(|| vertex_host(&location));
            Ok(GeminiEndpoint::Vertex {
                project: project.to_string(),
                location,
                base_url,
                access_token: settings.access_token.clone(),
            })
        } else {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                Error::missing_credential(
                    "Gemini API key is required for token counting",
                    ErrorContext::new()
                        .with_field_path("gemini_api_key")
                        .with_details("provide gemini_api_key or set GOOGLE_API_KEY / GEMINI_API_KEY")
                        .with_source("gemini_driver"),
                )
            })?;
            Ok(GeminiEndpoint::Direct {
                api_key: api_key.to_string(),
                base_url: settings
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            })
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self, GeminiEndpoint::Vertex { .. })
    }

    /// Build the `countTokens` request for `text` against `model`.
    pub fn build_request(&self, text: &str, model: &str) -> DriverRequest {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": text }] }],
        });

        match self {
            GeminiEndpoint::Direct { api_key, base_url } => DriverRequest {
                url: format!(
                    "{}/v1beta/models/{}:countTokens",
                    base_url.trim_end_matches('/'),
                    model
                ),
                headers: vec![("x-goog-api-key".to_string(), api_key.clone())],
                bearer: None,
                body,
            },
            GeminiEndpoint::Vertex {
                project,
                location,
                base_url,
                access_token,
            } => DriverRequest {
                url: format!(
                    "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:countTokens",
                    base_url.trim_end_matches('/'),
                    project,
                    location,
                    model
                ),
                headers: Vec::new(),
                bearer: access_token.clone(),
                body,
            },
        }
    }
}

impl std::fmt::Debug for GeminiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiEndpoint::Direct { base_url, .. } => f
                .debug_struct("Direct")
                .field("base_url", base_url)
                .finish_non_exhaustive(),
            GeminiEndpoint::Vertex {
                project,
                location,
                base_url,
                access_token,
            } => f
                .debug_struct("Vertex")
                .field("project", project)
                .field("location", location)
                .field("base_url", base_url)
                .field("has_access_token", &access_token.is_some())
                .finish(),
        }
    }
}

fn vertex_host(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{}-aiplatform.googleapis.com", location)
    }
}

#[cfg(feature = "gemini")]
#[derive(Debug)]
struct GeminiClient {
    endpoint: GeminiEndpoint,
    transport: HttpTransport,
}

/// Remote counting driver for Gemini models.
#[derive(Debug)]
pub struct GeminiDriver {
    settings: GeminiSettings,
    #[cfg(feature = "gemini")]
    http: HttpSettings,
    #[cfg(feature = "gemini")]
    client: OnceCell<GeminiClient>,
}

impl GeminiDriver {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            settings: GeminiSettings::from_config(config),
            #[cfg(feature = "gemini")]
            http: config.http.clone(),
            #[cfg(feature = "gemini")]
            client: OnceCell::new(),
        }
    }

    /// Gemini: `{ "totalTokens": 31, "totalBillableCharacters": 96 }`
    pub fn parse_response(body: &Value) -> Result<u64> {
        read_count(body, "totalTokens", "gemini")
    }

    /// Count through the configured route.
    ///
    /// The backend is checked before credentials: with `gemini` compiled out
    /// this is always `DependencyMissing`.
    #[cfg(feature = "gemini")]
    pub fn count(&self, text: &str, model: &str) -> Result<u64> {
        let client = self.client()?;
        let request = client.endpoint.build_request(text, model);
        tracing::debug!(
            model,
            vertex = client.endpoint.is_vertex(),
            url = %request.url,
            "gemini countTokens"
        );
        let body = client.transport.post_json(
            &request.url,
            &request.headers,
            request.bearer.as_deref(),
            &request.body,
        )?;
        Self::parse_response(&body)
    }

    #[cfg(not(feature = "gemini"))]
    pub fn count(&self, _text: &str, _model: &str) -> Result<u64> {
        Err(super::feature_disabled("reqwest", "gemini", "gemini_driver"))
    }

    #[cfg(feature = "gemini")]
    fn client(&self) -> Result<&GeminiClient> {
        self.client.get_or_try_init(|| {
            let endpoint = GeminiEndpoint::from_settings(&self.settings)?;
            let transport = HttpTransport::new(&self.http)?;
            Ok(GeminiClient {
                endpoint,
                transport,
            })
        })
    }

    /// Whether the HTTP client has been built yet.
    pub fn is_connected(&self) -> bool {
        #[cfg(feature = "gemini")]
        {
            self.client.get().is_some()
        }
        #[cfg(not(feature = "gemini"))]
        {
            false
        }
    }
}

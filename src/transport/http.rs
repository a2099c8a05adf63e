use crate::config::HttpSettings;
use crate::Result;
use reqwest::blocking::Client;
use reqwest::Proxy;
use serde_json::Value;
use std::time::Duration;

use super::TransportError;

/// Blocking JSON-over-HTTP transport shared by the remote drivers.
///
/// One instance is built per driver on first use and reused for every call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .pool_max_idle_per_host(4);

        if let Some(proxy_url) = settings.proxy_url.as_deref() {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(proxy = proxy_url, error = %e, "ignoring invalid proxy url"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// Non-2xx replies become [`crate::Error::Remote`]; nothing is retried.
    pub fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        bearer: Option<&str>,
        body: &Value,
    ) -> Result<Value> {
        let mut request = self.client.post(url).json(body);
        for (k, v) in headers {
            request = request.header(k.as_str(), v.as_str());
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(TransportError::Http)?;
        let status = response.status();
        let text = response.text().map_err(TransportError::Http)?;

        if !status.is_success() {
            let (class, message) = remote_error_details(&text, status.as_u16());
            return Err(crate::Error::Remote {
                status: status.as_u16(),
                class,
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            crate::Error::from(TransportError::InvalidResponse(format!(
                "response body is not JSON: {}",
                e
            )))
        })
    }
}

/// Pull `(class, message)` out of a provider error envelope.
///
/// Anthropic: `{"type":"error","error":{"type":"...","message":"..."}}`
/// Google:    `{"error":{"code":400,"message":"...","status":"INVALID_ARGUMENT"}}`
pub(crate) fn remote_error_details(body: &str, status: u16) -> (String, String) {
    let fallback_class = http_status_class(status).to_string();
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let class = error
        .and_then(|e| e.get("type").or_else(|| e.get("status")))
        .and_then(|c| c.as_str())
        .map(String::from)
        .unwrap_or(fallback_class);

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.chars().take(512).collect()
            }
        });

    (class, message)
}

fn http_status_class(status: u16) -> &'static str {
    match status {
        400 => "invalid_request",
        401 => "authentication",
        403 => "permission_denied",
        404 => "not_found",
        413 => "request_too_large",
        429 => "rate_limited",
        500..=599 => "server_error",
        _ => "http_error",
    }
}

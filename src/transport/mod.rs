//! HTTP transport for the remote counting endpoints.
//!
//! The client itself is only compiled with `anthropic` or `gemini`; the error
//! type is always present so response decoding can report malformed replies.

#[cfg(any(feature = "anthropic", feature = "gemini"))]
mod http;

#[cfg(any(feature = "anthropic", feature = "gemini"))]
pub use http::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[cfg(any(feature = "anthropic", feature = "gemini"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Other(String),
}

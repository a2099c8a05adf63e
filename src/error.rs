use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.anthropic_api_key", "text")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., how to fix it)
    pub details: Option<String>,
    /// Source of the error (e.g., "anthropic_driver", "counter")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse error category, mirroring the failure taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    MissingCredential,
    DependencyMissing,
    Transport,
    Remote,
}

/// Unified error type for token counting.
///
/// Cost estimation never produces one of these: pricing failures are
/// absorbed by the estimator and only show up as an absent cost.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {message}{}", format_context(.context))]
    InvalidArgument {
        message: String,
        context: ErrorContext,
    },

    #[error("Missing credential: {message}{}", format_context(.context))]
    MissingCredential {
        message: String,
        context: ErrorContext,
    },

    #[error("Dependency missing: {dependency} is required ({message}){}", format_context(.context))]
    DependencyMissing {
        dependency: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: HTTP {status} ({class}): {message}")]
    Remote {
        status: u16,
        class: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new invalid-argument error with structured context
    pub fn invalid_argument(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
            context,
        }
    }

    /// Create a new missing-credential error with structured context
    pub fn missing_credential(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::MissingCredential {
            message: msg.into(),
            context,
        }
    }

    /// Create a new dependency-missing error with structured context
    pub fn dependency_missing(
        dependency: impl Into<String>,
        msg: impl Into<String>,
        context: ErrorContext,
    ) -> Self {
        Error::DependencyMissing {
            dependency: dependency.into(),
            message: msg.into(),
            context,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::MissingCredential { .. } => ErrorKind::MissingCredential,
            Error::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            Error::Transport(_) | Error::Serialization(_) => ErrorKind::Transport,
            Error::Remote { .. } => ErrorKind::Remote,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidArgument { context, .. }
            | Error::MissingCredential { context, .. }
            | Error::DependencyMissing { context, .. } => Some(context),
            _ => None,
        }
    }
}

//! # token-check
//!
//! 统一的多厂商 Token 计数与输入成本估算库。
//!
//! Unified token counting for OpenAI, Anthropic and Google Gemini models, with
//! optional input-cost estimation.
//!
//! ## Overview
//!
//! [`TokenCounter::count_tokens`] validates the text, dispatches on
//! [`Provider`] to one counting driver, and returns a [`TokenCountResult`]:
//!
//! | Provider | How tokens are counted | Needs |
//! |----------|------------------------|-------|
//! | OpenAI | locally with tiktoken, offline | nothing |
//! | Anthropic | Messages `count_tokens` API | `anthropic_api_key` |
//! | Gemini | `countTokens` API, direct or Vertex AI | `gemini_api_key`, or `use_vertex_ai` + `gemini_project_id` |
//!
//! With `estimate_cost = true` the count is priced as input tokens against the
//! bundled price catalog (or a custom [`pricing::PriceLookup`]). Pricing is
//! best-effort: if no price matches, the cost is simply absent.
//!
//! ## Quick Start
//!
//! ```rust
//! use token_check::{Provider, TokenCounter};
//!
//! // No API key required for OpenAI
//! let counter = TokenCounter::new();
//! let text = "Hello, world! How many tokens is this message?";
//!
//! let result = counter.count_tokens(text, Provider::OpenAi, "gpt-4o", true).unwrap();
//! println!("OpenAI: {} tokens", result.tokens);
//! if let Some(cost) = result.estimated_cost() {
//!     println!("Estimated cost: ${:.6}", cost);
//! }
//! ```
//!
//! Remote providers take credentials at construction:
//!
//! ```rust,no_run
//! use token_check::{Provider, TokenCounter};
//!
//! let counter = TokenCounter::builder()
//!     .anthropic_api_key(std::env::var("ANTHROPIC_API_KEY").unwrap_or_default())
//!     .build();
//! let result = counter.count_tokens(
//!     "Hello, Claude",
//!     Provider::Anthropic,
//!     "claude-sonnet-4-20250514",
//!     true,
//! )?;
//! # Ok::<(), token_check::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`counter`] | The counting facade and its builder |
//! | [`drivers`] | Per-provider counting strategies |
//! | [`pricing`] | Price catalog, lookup trait and cost estimator |
//! | [`config`] | Construction-time configuration and environment loading |
//! | [`transport`] | Blocking HTTP transport for the remote drivers |
//!
//! ## Cargo features
//!
//! `openai`, `anthropic`, `gemini` and `pricing` are enabled by default. A
//! disabled counting feature makes that provider fail with
//! [`ErrorKind::DependencyMissing`]; without `pricing` costs are always absent.

pub mod config;
pub mod counter;
pub mod drivers;
pub mod pricing;
pub mod provider;
pub mod transport;
pub mod types;

pub use config::CounterConfig;
pub use counter::{TokenCounter, TokenCounterBuilder};
pub use provider::Provider;
pub use types::{CostEstimate, TokenCountResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};

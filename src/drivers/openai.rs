//! Offline OpenAI token counting with tiktoken.
//!
//! Encodings are resolved per model name and cached for the life of the
//! driver. A model name tiktoken does not recognise falls back to
//! [`DEFAULT_ENCODING`] instead of failing, so any OpenAI-family model id can
//! be counted offline. Counts for models whose real tokenizer differs from
//! `o200k_base` are approximate under that fallback.

use crate::Result;

#[cfg(feature = "openai")]
use std::collections::HashMap;
#[cfg(feature = "openai")]
use std::sync::{Arc, PoisonError, RwLock};
#[cfg(feature = "openai")]
use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
#[cfg(feature = "openai")]
use tiktoken_rs::CoreBPE;
#[cfg(feature = "openai")]
use tracing::{debug, warn};

/// Encoding used when a model name is unknown to tiktoken (GPT-4o family).
pub const DEFAULT_ENCODING: &str = "o200k_base";

#[cfg(feature = "openai")]
struct Encoding {
    name: &'static str,
    bpe: CoreBPE,
}

#[cfg(feature = "openai")]
#[derive(Default)]
struct EncodingCache {
    by_model: HashMap<String, Arc<Encoding>>,
    // Models resolving to the same encoding share one BPE.
    by_name: HashMap<&'static str, Arc<Encoding>>,
}

/// Local tokenizer driver for OpenAI models.
#[derive(Default)]
pub struct TiktokenDriver {
    #[cfg(feature = "openai")]
    cache: RwLock<EncodingCache>,
}

impl std::fmt::Debug for TiktokenDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenDriver")
            .field("cached_models", &self.cached_models())
            .finish()
    }
}

impl TiktokenDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count tokens in `text` with the encoding resolved for `model`.
    pub fn count(&self, text: &str, model: &str) -> Result<u64> {
        #[cfg(feature = "openai")]
        {
            let encoding = self.resolve(model)?;
            Ok(encoding.bpe.encode_ordinary(text).len() as u64)
        }
        #[cfg(not(feature = "openai"))]
        {
            let _ = (text, model);
            Err(dependency_missing())
        }
    }

    /// Name of the encoding `model` resolves to (e.g. `"cl100k_base"`).
    pub fn encoding_for(&self, model: &str) -> Result<&'static str> {
        #[cfg(feature = "openai")]
        {
            Ok(self.resolve(model)?.name)
        }
        #[cfg(not(feature = "openai"))]
        {
            let _ = model;
            Err(dependency_missing())
        }
    }

    /// Number of model names with a cached encoding.
    pub fn cached_models(&self) -> usize {
        #[cfg(feature = "openai")]
        {
            self.cache
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .by_model
                .len()
        }
        #[cfg(not(feature = "openai"))]
        {
            0
        }
    }

    #[cfg(feature = "openai")]
    fn resolve(&self, model: &str) -> Result<Arc<Encoding>> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(enc) = cache.by_model.get(model) {
                return Ok(enc.clone());
            }
        }

        let tokenizer = match get_tokenizer(model) {
            Some(t) => t,
            None => {
                warn!(
                    model,
                    encoding = DEFAULT_ENCODING,
                    "model not recognised by tiktoken, using default encoding"
                );
                Tokenizer::O200kBase
            }
        };
        let name = encoding_name(tokenizer);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let encoding = match cache.by_name.get(name) {
            Some(enc) => enc.clone(),
            None => {
                let bpe = tiktoken_rs::get_bpe_from_tokenizer(tokenizer).map_err(|e| {
                    crate::Error::dependency_missing(
                        "tiktoken-rs",
                        format!("failed to load {} encoding: {}", name, e),
                        crate::ErrorContext::new().with_source("tiktoken_driver"),
                    )
                })?;
                let enc = Arc::new(Encoding { name, bpe });
                cache.by_name.insert(name, enc.clone());
                enc
            }
        };
        debug!(model, encoding = name, "cached tiktoken encoding");
        cache.by_model.insert(model.to_string(), encoding.clone());
        Ok(encoding)
    }
}

#[cfg(feature = "openai")]
fn encoding_name(tokenizer: Tokenizer) -> &'static str {
    match tokenizer {
        Tokenizer::O200kBase => "o200k_base",
        Tokenizer::Cl100kBase => "cl100k_base",
        Tokenizer::P50kBase => "p50k_base",
        Tokenizer::P50kEdit => "p50k_edit",
        Tokenizer::R50kBase => "r50k_base",
        Tokenizer::Gpt2 => "gpt2",
    }
}

#[cfg(not(feature = "openai"))]
fn dependency_missing() -> crate::Error {
    super::feature_disabled("tiktoken-rs", "openai", "tiktoken_driver")
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;

    #[test]
    fn test_known_models_resolve_their_encoding() {
        let driver = TiktokenDriver::new();
        assert_eq!(driver.encoding_for("gpt-4o").unwrap(), "o200k_base");
        assert_eq!(driver.encoding_for("gpt-4o-2024-08-06").unwrap(), "o200k_base");
        assert_eq!(driver.encoding_for("gpt-4").unwrap(), "cl100k_base");
        assert_eq!(driver.encoding_for("gpt-3.5-turbo").unwrap(), "cl100k_base");
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let driver = TiktokenDriver::new();
        assert_eq!(driver.encoding_for("my-fine-tune-xyz").unwrap(), DEFAULT_ENCODING);

        let first = driver.count("Offline counting still works.", "my-fine-tune-xyz").unwrap();
        let second = driver.count("Offline counting still works.", "my-fine-tune-xyz").unwrap();
        assert_eq!(first, second);
        assert_eq!(driver.cached_models(), 1);
    }

    #[test]
    fn test_fallback_matches_default_encoding_count() {
        let driver = TiktokenDriver::new();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(
            driver.count(text, "not-a-real-model").unwrap(),
            driver.count(text, "gpt-4o").unwrap()
        );
    }

    #[test]
    fn test_hello_world() {
        let driver = TiktokenDriver::new();
        assert_eq!(driver.count("Hello, world!", "gpt-4o").unwrap(), 4);
    }

    #[test]
    fn test_cache_keyed_by_model_string() {
        let driver = TiktokenDriver::new();
        driver.count("a", "gpt-4o").unwrap();
        driver.count("b", "gpt-4o").unwrap();
        driver.count("c", "gpt-4o-mini").unwrap();
        driver.count("d", "gpt-4").unwrap();
        assert_eq!(driver.cached_models(), 3);
        // gpt-4o and gpt-4o-mini share one o200k_base BPE
        assert_eq!(driver.cache.read().unwrap().by_name.len(), 2);
    }

    #[test]
    fn test_special_token_text_counts_as_plain_text() {
        let driver = TiktokenDriver::new();
        let n = driver.count("<|endoftext|>", "gpt-4o").unwrap();
        assert!(n > 1);
    }
}

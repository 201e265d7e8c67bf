use std::collections::HashMap;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
pub use tiktoken_rs::CoreBPE;
use tiktoken_rs::get_bpe_from_model;
use log::debug;

use crate::errors::ConfigError;
use crate::utils::token::CountToken;
use lazy_static::lazy_static;

lazy_static! {
    /// const map from routed model name to the tiktoken encoding that approximates its tokenizer.
    pub static ref MODEL_TO_ENCODING: HashMap<&'static str, &'static str> = HashMap::from([
        ("deepseek/deepseek-r1", "o200k_base"),
        ("deepseek/deepseek-chat", "o200k_base"),
        ("openai/o1-mini", "o200k_base"),
        ("openai/o1", "o200k_base"),
        ("openai/o3", "o200k_base"),
        ("openai/gpt-4o", "o200k_base"),
        ("openai/gpt-4o-mini", "o200k_base"),
        ("openai/gpt-5", "o200k_base"),
        ("openai/gpt-5-mini", "o200k_base"),
        ("openai/gpt-5.1", "o200k_base"),
        ("openai/gpt-5.2", "o200k_base"),
        ("google/gemini-2.5-pro-preview", "o200k_base"),
        ("google/gemini-2.5-pro", "o200k_base"),
        ("google/gemini-3-flash-preview", "o200k_base"),
        ("google/gemini-3-pro-preview", "o200k_base"),
    ]);
}

fn bpe_from_encoding(encoding: &str) -> Result<CoreBPE> {
    match encoding {
        "o200k_base" => tiktoken_rs::o200k_base(),
        "cl100k_base" => tiktoken_rs::cl100k_base(),
        "p50k_base" => tiktoken_rs::p50k_base(),
        "p50k_edit" => tiktoken_rs::p50k_edit(),
        "r50k_base" => tiktoken_rs::r50k_base(),
        other => anyhow::bail!("unknown tiktoken encoding {}", other),
    }
}

/// Counter using the Tiktoken tokenizer.
#[readonly::make]
pub struct Tiktoken {
    /// The model name of the tokenizer. read-only.
    #[readonly]
    pub model: String,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter for a model identifier.
    ///
    /// The identifier is looked up in [MODEL_TO_ENCODING] first. Otherwise tiktoken resolves it by name, trying the
    /// full identifier and then the part after the provider prefix (`openai/gpt-4` -> `gpt-4`). A model nothing
    /// resolves is a [ConfigError].
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let bpe = match MODEL_TO_ENCODING.get(model.as_str()) {
            Some(encoding) => bpe_from_encoding(encoding)?,
            None => {
                let bare_model = model.rsplit('/').next().unwrap_or(model.as_str());
                get_bpe_from_model(model.as_str())
                    .or_else(|_| get_bpe_from_model(bare_model))
                    .map_err(|e| ConfigError::for_model(&model, format!("no tokenizer found: {}", e)))?
            }
        };
        debug!("Resolved tokenizer for model {}", model);
        Ok(Tiktoken {
            model,
            bpe,
        })
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}

/// Count the tokens of `text` under the tokenizer of `model`.
pub fn count_tokens(text: &str, model: &str) -> Result<usize> {
    Ok(Tiktoken::new(model)?.count_token(text))
}

/// Count the tokens of a UTF-8 file under the tokenizer of `model`.
pub fn count_tokens_from_file(path: impl AsRef<Path>, model: &str) -> Result<usize> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    count_tokens(&text, model)
}

//! # Manuscript
//!
//! The per-run configuration: the endpoint base URL and one [StageConfig] per pipeline [Stage].
//!
//! A manuscript is a relaxed JSON (JSON5) document, so comments and trailing commas are fine:
//!
//! ```json5
//! {
//!   api_base_path: "https://openrouter.ai/api/v1",
//!   characters: { model: "openai/gpt-4o", temperature: 0.9, top_p: 0.9 },
//!   story: { model: "deepseek/deepseek-r1", temperature: 0.8, top_p: 0.9, reasoning_effort: "high" },
//!   // ...one object per stage
//! }
//! ```
//!
//! The whole document is validated by [Manuscript::parse], so a missing stage or key surfaces before the first
//! request of a run.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::{Map, Value};
use url::Url;

use crate::errors::ConfigError;
use crate::utils::llm::openai::CompletionOptions;

/// One step of the pipeline that talks to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Characters,
    Story,
    EnhanceStory1,
    EnhanceStory2,
    TitleAndSynopsis,
    Frontmatter,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Characters,
        Stage::Story,
        Stage::EnhanceStory1,
        Stage::EnhanceStory2,
        Stage::TitleAndSynopsis,
        Stage::Frontmatter,
    ];

    /// The stage's key in the manuscript.
    pub fn key(&self) -> &'static str {
        match self {
            Stage::Characters => "characters",
            Stage::Story => "story",
            Stage::EnhanceStory1 => "enhance_story1",
            Stage::EnhanceStory2 => "enhance_story2",
            Stage::TitleAndSynopsis => "title_and_synopsis",
            Stage::Frontmatter => "frontmatter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How long a reasoning model may deliberate before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(ReasoningEffort::Low),
            "medium" => Some(ReasoningEffort::Medium),
            "high" => Some(ReasoningEffort::High),
            _ => None,
        }
    }
}

impl From<ReasoningEffort> for async_openai::types::ReasoningEffort {
    fn from(effort: ReasoningEffort) -> Self {
        match effort {
            ReasoningEffort::Low => async_openai::types::ReasoningEffort::Low,
            ReasoningEffort::Medium => async_openai::types::ReasoningEffort::Medium,
            ReasoningEffort::High => async_openai::types::ReasoningEffort::High,
        }
    }
}

/// Model and sampling parameters of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub max_completion_tokens: Option<u32>,
}

impl StageConfig {
    fn from_value(stage: Stage, value: Option<&Value>) -> Result<Self, ConfigError> {
        let stage_key = stage.key();
        let object = match value {
            Some(Value::Object(object)) => object,
            Some(_) => return Err(ConfigError::for_stage(stage_key, "stage must be an object")),
            None => return Err(ConfigError::for_stage(stage_key, "stage is missing from the manuscript")),
        };

        let model = match object.get("model") {
            Some(Value::String(model)) if !model.trim().is_empty() => model.clone(),
            Some(_) => return Err(ConfigError::for_key(stage_key, "model", "must be a non-empty string")),
            None => return Err(ConfigError::for_key(stage_key, "model", "missing")),
        };
        let temperature = required_number(stage_key, object, "temperature", 0.0, 2.0)?;
        let top_p = required_number(stage_key, object, "top_p", 0.0, 1.0)?;

        let reasoning_effort = match object.get("reasoning_effort") {
            None | Some(Value::Null) => None,
            Some(Value::String(effort)) => Some(ReasoningEffort::parse(effort).ok_or_else(|| {
                ConfigError::for_key(stage_key, "reasoning_effort", format!("expected low, medium or high, got {}", effort))
            })?),
            Some(other) => return Err(ConfigError::for_key(stage_key, "reasoning_effort", format!("expected a string, got {}", other))),
        };

        let max_completion_tokens = match object.get("max_completion_tokens") {
            None | Some(Value::Null) => None,
            Some(value) => match as_whole_number(value) {
                Some(tokens) if tokens > 0 && tokens <= u32::MAX as u64 => Some(tokens as u32),
                _ => return Err(ConfigError::for_key(stage_key, "max_completion_tokens", format!("expected a positive integer, got {}", value))),
            },
        };

        Ok(Self {
            model,
            temperature,
            top_p,
            reasoning_effort,
            max_completion_tokens,
        })
    }

    /// Completion options carrying this stage's parameters.
    pub fn options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            max_completion_tokens: self.max_completion_tokens,
            reasoning_effort: self.reasoning_effort,
        }
    }
}

/// JSON5 readers may hand integers over as floats.
fn as_whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value.as_f64()
            .filter(|number| number.is_finite() && number.fract() == 0.0 && *number >= 0.0)
            .map(|number| number as u64)
    })
}

fn required_number(stage: &str, object: &Map<String, Value>, key: &str, min: f64, max: f64) -> Result<f32, ConfigError> {
    match object.get(key) {
        Some(value) => match value.as_f64() {
            Some(number) if number.is_finite() && number >= min && number <= max => Ok(number as f32),
            _ => Err(ConfigError::for_key(stage, key, format!("expected a number in [{}, {}], got {}", min, max, value))),
        },
        None => Err(ConfigError::for_key(stage, key, "missing")),
    }
}

/// The per-run configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Manuscript {
    pub api_base_path: Url,
    pub characters: StageConfig,
    pub story: StageConfig,
    pub enhance_story1: StageConfig,
    pub enhance_story2: StageConfig,
    pub title_and_synopsis: StageConfig,
    pub frontmatter: StageConfig,
}

impl Manuscript {
    /// Read and validate a manuscript file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("cannot read manuscript {}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Parse and validate a manuscript document.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = json5::from_str(text)
            .map_err(|e| ConfigError::new(format!("manuscript is not valid relaxed JSON: {}", e)))?;
        Ok(Self::from_value(&document)?)
    }

    fn from_value(document: &Value) -> Result<Self, ConfigError> {
        let object = document
            .as_object()
            .ok_or_else(|| ConfigError::new("manuscript must be an object"))?;

        let api_base_path = match object.get("api_base_path") {
            Some(Value::String(url)) => Url::parse(url)
                .map_err(|e| ConfigError::for_key("manuscript", "api_base_path", format!("invalid URL {}: {}", url, e)))?,
            Some(other) => return Err(ConfigError::for_key("manuscript", "api_base_path", format!("expected a URL string, got {}", other))),
            None => return Err(ConfigError::for_key("manuscript", "api_base_path", "api_base_path is not set in manuscript")),
        };

        let stage = |stage: Stage| StageConfig::from_value(stage, object.get(stage.key()));
        Ok(Self {
            api_base_path,
            characters: stage(Stage::Characters)?,
            story: stage(Stage::Story)?,
            enhance_story1: stage(Stage::EnhanceStory1)?,
            enhance_story2: stage(Stage::EnhanceStory2)?,
            title_and_synopsis: stage(Stage::TitleAndSynopsis)?,
            frontmatter: stage(Stage::Frontmatter)?,
        })
    }

    pub fn stage(&self, stage: Stage) -> &StageConfig {
        match stage {
            Stage::Characters => &self.characters,
            Stage::Story => &self.story,
            Stage::EnhanceStory1 => &self.enhance_story1,
            Stage::EnhanceStory2 => &self.enhance_story2,
            Stage::TitleAndSynopsis => &self.title_and_synopsis,
            Stage::Frontmatter => &self.frontmatter,
        }
    }

    /// `api_base_path` without the trailing slash, the form the client joins paths onto.
    pub fn api_base(&self) -> &str {
        self.api_base_path.as_str().trim_end_matches('/')
    }
}

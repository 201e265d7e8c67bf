//! Failure kinds of a run.
//!
//! Every public API returns [anyhow::Result]; the concrete kinds below are what the error downcasts to.
//! Filesystem failures stay [std::io::Error] with the path attached as context.

use std::error::Error;
use std::fmt;
use std::fmt::Formatter;

use async_openai::error::OpenAIError;

/// Missing or unparseable manuscript, missing stage or stage key, unresolvable tokenizer, missing credentials or an
/// out-of-range enhancement count.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub stage: Option<String>,
    pub key: Option<String>,
    pub reason: String,
}

impl ConfigError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            stage: None,
            key: None,
            reason: reason.into(),
        }
    }

    pub fn for_stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            key: None,
            reason: reason.into(),
        }
    }

    pub fn for_key(stage: impl Into<String>, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            key: Some(key.into()),
            reason: reason.into(),
        }
    }

    pub fn for_model(model: &str, reason: impl Into<String>) -> Self {
        Self {
            stage: None,
            key: Some("model".to_string()),
            reason: format!("{}: {}", model, reason.into()),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.stage, &self.key) {
            (Some(stage), Some(key)) => write!(f, "ConfigError: {}.{}: {}", stage, key, self.reason),
            (Some(stage), None) => write!(f, "ConfigError: {}: {}", stage, self.reason),
            (None, Some(key)) => write!(f, "ConfigError: {}: {}", key, self.reason),
            (None, None) => write!(f, "ConfigError: {}", self.reason),
        }
    }
}

impl Error for ConfigError {}

/// Both the system prompt and the user prompt of a completion call are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError;

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InputError: prompt and system prompt are both empty")
    }
}

impl Error for InputError {}

/// The endpoint answered successfully but the message content is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyResponseError {
    pub model: String,
    pub finish_reason: Option<String>,
}

impl fmt::Display for EmptyResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EmptyResponseError: response from {} is ok but content is empty (finish reason: {})",
               self.model,
               self.finish_reason.as_deref().unwrap_or("unknown"))
    }
}

impl Error for EmptyResponseError {}

/// Network or service failure of the endpoint, including responses that do not have the expected shape.
#[derive(Debug)]
pub struct TransportError {
    pub model: String,
    pub source: OpenAIError,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TransportError: request to {} failed: {}", self.model, self.source)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// A structured response does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub schema: String,
    pub reason: String,
    pub content: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ValidationError: response does not match schema {}: {}\nGot content:\n{}",
               self.schema, self.reason, self.content)
    }
}

impl Error for ValidationError {}

#[cfg(test)]
mod test_errors {
    use super::ConfigError;

    #[test]
    fn test_config_error_names_stage_and_key() {
        let err = ConfigError::for_key("enhance_story1", "top_p", "missing");
        assert_eq!("ConfigError: enhance_story1.top_p: missing", err.to_string());
        assert_eq!("ConfigError: no manuscript", ConfigError::new("no manuscript").to_string());
    }
}

//! The seam between the pipeline and the text-generation endpoint.
//!
//! Stages hold a [ChatCompletion] and never talk to the network themselves. [openai::OpenAICompletionClient] is the
//! implementation that does.

pub mod openai;
#[cfg(test)]
pub(crate) mod scripted;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ValidationError;
use crate::utils::llm::openai::CompletionOptions;

/// JSON schema a structured completion must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub description: Option<String>,
    pub schema: Value,
    pub strict: bool,
}

/// One completion call with defaults and bookkeeping.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Free-text mode. Never returns an empty string.
    async fn complete(&self, system_prompt: &str, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Structured mode. Returns the JSON object the model produced for `schema`, not yet checked against it.
    async fn complete_json(&self,
                           system_prompt: &str,
                           prompt: &str,
                           options: &CompletionOptions,
                           schema: &ResponseSchema) -> Result<Value>;
}

/// Structured mode, deserialized into `T`. A reply that does not deserialize is a [ValidationError].
pub async fn complete_structured<T, C>(client: &C,
                                       system_prompt: &str,
                                       prompt: &str,
                                       options: &CompletionOptions,
                                       schema: &ResponseSchema) -> Result<T>
    where T: DeserializeOwned,
          C: ChatCompletion + ?Sized {
    let value = client.complete_json(system_prompt, prompt, options, schema).await?;
    serde_json::from_value(value.clone()).map_err(|e| ValidationError {
        schema: schema.name.clone(),
        reason: e.to_string(),
        content: value.to_string(),
    }.into())
}

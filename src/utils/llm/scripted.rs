//! In-process [ChatCompletion] for stage tests: replies from a script and records every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::errors::EmptyResponseError;
use crate::utils::llm::openai::CompletionOptions;
use crate::utils::llm::{ChatCompletion, ResponseSchema};

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub system_prompt: String,
    pub prompt: String,
    pub options: CompletionOptions,
    pub schema: Option<String>,
}

#[derive(Default)]
pub(crate) struct ScriptedModel {
    texts: Mutex<VecDeque<String>>,
    json: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedModel {
    /// Free-text replies in call order. An empty reply answers like an empty successful response.
    pub fn with_texts<I: IntoIterator<Item = S>, S: Into<String>>(texts: I) -> Self {
        Self {
            texts: Mutex::new(texts.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn then_json(self, value: Value) -> Self {
        self.json.lock().unwrap().push_back(value);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, system_prompt: &str, prompt: &str, options: &CompletionOptions, schema: Option<&ResponseSchema>) {
        self.calls.lock().unwrap().push(Call {
            system_prompt: system_prompt.to_string(),
            prompt: prompt.to_string(),
            options: options.clone(),
            schema: schema.map(|schema| schema.name.clone()),
        });
    }
}

#[async_trait]
impl ChatCompletion for ScriptedModel {
    async fn complete(&self, system_prompt: &str, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.record(system_prompt, prompt, options, None);
        let reply = self.texts.lock().unwrap().pop_front().ok_or_else(|| anyhow!("script has no more text replies"))?;
        if reply.is_empty() {
            return Err(EmptyResponseError { model: options.model.clone(), finish_reason: None }.into());
        }
        Ok(reply)
    }

    async fn complete_json(&self,
                           system_prompt: &str,
                           prompt: &str,
                           options: &CompletionOptions,
                           schema: &ResponseSchema) -> Result<Value> {
        self.record(system_prompt, prompt, options, Some(schema));
        self.json.lock().unwrap().pop_front().ok_or_else(|| anyhow!("script has no more json replies"))
    }
}

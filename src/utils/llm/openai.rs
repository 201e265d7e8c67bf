use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
                          ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
                          CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ResponseFormat,
                          ResponseFormatJsonSchema};
use async_openai::Client;
use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use crate::errors::{EmptyResponseError, InputError, TransportError, ValidationError};
use crate::manuscript::{Manuscript, ReasoningEffort};
use crate::utils::llm::{ChatCompletion, ResponseSchema};
use crate::utils::postprocess::json::filter_to_json;

/// Sampling temperature when the caller gives none.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Nucleus probability when the caller gives none.
pub const DEFAULT_TOP_P: f32 = 0.85;
/// Completion ceiling when the caller gives none, sized for long-form prose.
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 32_000;

/// Per-call model and sampling parameters. `None` fields fall back to the defaults above, except
/// `reasoning_effort`, which is left out of the request so the service decides.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_completion_tokens: None,
            reasoning_effort: None,
        }
    }

    #[inline]
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    #[inline]
    pub fn top_p(&self) -> f32 {
        self.top_p.unwrap_or(DEFAULT_TOP_P)
    }

    #[inline]
    pub fn max_completion_tokens(&self) -> u32 {
        self.max_completion_tokens.unwrap_or(DEFAULT_MAX_COMPLETION_TOKENS)
    }

    /// Same options with the completion ceiling replaced.
    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_completion_tokens);
        self
    }

    /// Same options with `effort` filled in when none is set.
    pub fn with_default_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort.get_or_insert(effort);
        self
    }
}

/// async-openai retries rate-limited and 5xx responses by default. A run has no retry, so the backoff gives up at once.
fn no_retry() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// [ChatCompletion] over an OpenAI-compatible chat completions endpoint (OpenRouter, OpenAI, ...).
///
/// Every response the endpoint returns is kept, in order, for inspection after the run. See [Self::responses].
pub struct OpenAICompletionClient {
    client: Client<OpenAIConfig>,
    responses: Mutex<Vec<CreateChatCompletionResponse>>,
}

impl OpenAICompletionClient {
    /// `api_base` is the URL the `/chat/completions` path is appended to.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config).with_backoff(no_retry()),
            responses: Mutex::new(Vec::new()),
        }
    }

    pub fn from_manuscript(manuscript: &Manuscript, api_key: impl Into<String>) -> Self {
        Self::new(manuscript.api_base(), api_key)
    }

    /// Snapshot of all raw responses received so far.
    pub fn responses(&self) -> Vec<CreateChatCompletionResponse> {
        self.responses.lock().map(|responses| responses.clone()).unwrap_or_default()
    }

    fn record(&self, response: &CreateChatCompletionResponse) {
        debug!("{:?}", response);
        if let Ok(mut responses) = self.responses.lock() {
            responses.push(response.clone());
        }
    }

    fn build_request(system_prompt: &str,
                     prompt: &str,
                     options: &CompletionOptions,
                     response_format: Option<ResponseFormat>) -> Result<CreateChatCompletionRequest> {
        if system_prompt.is_empty() && prompt.is_empty() {
            return Err(InputError.into());
        }
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()?
                .into());
        }
        if !prompt.is_empty() {
            messages.push(ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into());
        }
        let mut request = CreateChatCompletionRequestArgs::default()
            .model(options.model.as_str())
            .messages(messages)
            .temperature(options.temperature())
            .top_p(options.top_p())
            .max_completion_tokens(options.max_completion_tokens())
            .build()?;
        request.reasoning_effort = options.reasoning_effort.map(Into::into);
        request.response_format = response_format;
        Ok(request)
    }

    async fn send(&self, model: &str, request: CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse> {
        info!("Requesting completion from {} (max_completion_tokens={:?})", model, request.max_completion_tokens);
        let response = self.client
            .chat()
            .create(request)
            .await
            .map_err(|source| TransportError { model: model.to_string(), source })?;
        self.record(&response);
        Ok(response)
    }
}

#[async_trait]
impl ChatCompletion for OpenAICompletionClient {
    async fn complete(&self, system_prompt: &str, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = Self::build_request(system_prompt, prompt, options, None)?;
        let response = self.send(&options.model, request).await?;
        let choice = response.choices.into_iter().next().ok_or_else(|| TransportError {
            model: options.model.clone(),
            source: async_openai::error::OpenAIError::InvalidArgument("response has no choices".to_string()),
        })?;
        match choice.message.content {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(EmptyResponseError {
                model: options.model.clone(),
                finish_reason: choice.finish_reason.map(|reason| format!("{:?}", reason)),
            }.into()),
        }
    }

    async fn complete_json(&self,
                           system_prompt: &str,
                           prompt: &str,
                           options: &CompletionOptions,
                           schema: &ResponseSchema) -> Result<Value> {
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: schema.description.clone(),
                name: schema.name.clone(),
                schema: Some(schema.schema.clone()),
                strict: Some(schema.strict),
            }
        };
        let request = Self::build_request(system_prompt, prompt, options, Some(response_format))?;
        let response = self.send(&options.model, request).await?;
        let message = response.choices.into_iter().next().map(|choice| choice.message);
        let content = match message {
            Some(message) => match (message.content, message.refusal) {
                (Some(content), _) if !content.is_empty() => content,
                (_, Some(refusal)) => return Err(ValidationError {
                    schema: schema.name.clone(),
                    reason: "model refused to answer".to_string(),
                    content: refusal,
                }.into()),
                _ => String::new(),
            },
            None => String::new(),
        };
        filter_to_json(content.as_str()).map_err(|e| ValidationError {
            schema: schema.name.clone(),
            reason: e.to_string(),
            content,
        }.into())
    }
}

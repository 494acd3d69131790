//! HTTP model client for Anthropic and OpenAI chat endpoints
//!
//! Every call is stateless: the system instruction and the user content are
//! sent fresh each time, with no conversation history.

use crate::auth;
use crate::invoker::{render_user_message, ModelInvoker};
use crate::retry::{retry_transient, RetryPolicy};
use crate::types::{
    AnthropicRequest, AnthropicResponse, ChatMessage, OpenAiChatRequest, OpenAiChatResponse,
    Provider, ResponseFormat, Usage,
};
use async_trait::async_trait;
use quill_core::config::QuillConfig;
use quill_core::{Context, InvocationFailure, QuillError, Result};
use std::time::Duration;
use tracing::{debug, info, instrument};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Model client with per-attempt timeout and transient-failure retry
#[derive(Debug, Clone)]
pub struct ModelClient {
    provider: Provider,
    model: String,
    max_tokens: usize,
    api_key_env: String,
    timeout: Duration,
    retry: RetryPolicy,
    base_url: String,
    http: reqwest::Client,
}

impl ModelClient {
    /// Create a client for the given provider and model
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        let api_key_env = match provider {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        };
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key_env: api_key_env.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            base_url: provider.default_base_url().to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Build a client from the `[model]` and `[retry]` config sections
    pub fn from_config(config: &QuillConfig) -> Result<Self> {
        let provider: Provider = config
            .model
            .provider
            .parse()
            .map_err(QuillError::Config)?;

        Ok(Self::new(provider, config.model.name.clone())
            .with_max_tokens(config.model.max_tokens)
            .with_api_key_env(config.model.api_key_env.clone())
            .with_timeout(Duration::from_secs(config.model.timeout_secs))
            .with_retry(RetryPolicy::from_config(&config.retry)))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = env_var.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the client at a different host (proxies, local gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// One bounded attempt against the provider
    async fn attempt(&self, api_key: &str, system: &str, user: &str) -> Result<String> {
        let call = async {
            match self.provider {
                Provider::Anthropic => self.call_anthropic(api_key, system, user).await,
                Provider::OpenAi => self.call_openai(api_key, system, user).await,
            }
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(QuillError::invocation(
                InvocationFailure::Timeout,
                format!("no response within {:?}", self.timeout),
            )),
        }
    }

    async fn call_anthropic(&self, api_key: &str, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.to_string(),
            messages: vec![ChatMessage::new("user", user)],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let body: AnthropicResponse = response.json().await.map_err(|e| {
            QuillError::invocation(
                InvocationFailure::MalformedResponse,
                format!("Failed to parse response: {}", e),
            )
        })?;

        log_usage(&self.model, body.usage.as_ref());

        let text: String = body
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(QuillError::invocation(
                InvocationFailure::MalformedResponse,
                "No text content in response",
            ));
        }
        Ok(text)
    }

    async fn call_openai(&self, api_key: &str, system: &str, user: &str) -> Result<String> {
        let request = OpenAiChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let body: OpenAiChatResponse = response.json().await.map_err(|e| {
            QuillError::invocation(
                InvocationFailure::MalformedResponse,
                format!("Failed to parse response: {}", e),
            )
        })?;

        let usage = body.usage.map(Usage::from);
        log_usage(&self.model, usage.as_ref());

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                QuillError::invocation(
                    InvocationFailure::MalformedResponse,
                    "No content in response",
                )
            })
    }
}

#[async_trait]
impl ModelInvoker for ModelClient {
    #[instrument(skip(self, system, user, aux), fields(provider = %self.provider, model = %self.model))]
    async fn invoke(&self, system: &str, user: &str, aux: Option<&Context>) -> Result<String> {
        let api_key = auth::resolve_api_key(&self.api_key_env)?;
        let message = render_user_message(user, aux);

        debug!("Invoking model ({} chars of input)", message.len());

        let output = retry_transient("model invocation", &self.retry, |attempt| {
            debug!("Sending request (attempt {})", attempt);
            self.attempt(&api_key, system, &message)
        })
        .await?;

        debug!("Model returned {} chars", output.len());
        Ok(output)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a send failure onto the invocation taxonomy
pub(crate) fn transport_error(error: reqwest::Error) -> QuillError {
    let kind = if error.is_timeout() {
        InvocationFailure::Timeout
    } else {
        InvocationFailure::Unavailable
    };
    QuillError::invocation(kind, format!("Failed to send request: {}", error))
}

/// Turn a non-success status into a classified error
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown".to_string());

    Err(QuillError::invocation(
        InvocationFailure::from_status(status.as_u16()),
        format!("API error {}: {}", status, error_text),
    ))
}

fn log_usage(model: &str, usage: Option<&Usage>) {
    if let Some(usage) = usage {
        info!(
            "{} call complete ({} input tokens, {} output tokens)",
            model, usage.input_tokens, usage.output_tokens
        );
    }
}

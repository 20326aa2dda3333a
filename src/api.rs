//! Chat-completion access for the per-article analysis.
//!
//! [`ChatCompletionClient`] talks to an OpenAI-compatible `chat/completions`
//! endpoint (Zhipu GLM by default) and [`RetryAsk`] optionally layers
//! rate-limit retries on top. Both implement [`AskAsync`], which is the only
//! thing the summarizer depends on.
//!
//! # Failure classes
//!
//! | Error | Retried |
//! |---|---|
//! | timeout | never; the article falls back at once |
//! | connect / transport | never |
//! | HTTP 429 or 5xx | yes, up to `max_retries` |
//! | other HTTP status, bad body | never |
//!
//! Retries are off by default (`max_retries: 0`). When enabled, the wait
//! before attempt `n + 1` is `base_delay * 2^(n-1)`, capped at 30 s, plus up to
//! 250 ms of jitter.

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e)
        } else {
            LlmError::Http(e)
        }
    }
}

impl LlmError {
    /// Only provider-side throttling and server faults are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Timeout(_) | LlmError::Http(_) | LlmError::InvalidResponse(_) => false,
        }
    }
}

/// A backend that answers one prompt with one completion.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, LlmError>;
}

/// Re-sends a prompt after retryable failures, with capped exponential backoff.
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// `max_retries` counts extra attempts; zero means a single call.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Wait before the attempt that follows failed attempt number `attempt` (1-based).
    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = rng().random_range(0..=self.max_jitter.as_millis() as u64);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, LlmError> {
        let started = Instant::now();
        let mut attempt = 1usize;

        loop {
            let err = match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt > self.max_retries {
                warn!(
                    attempt,
                    retryable = err.is_retryable(),
                    elapsed_ms = started.elapsed().as_millis(),
                    error = %err,
                    "LLM request failed"
                );
                return Err(err);
            }

            let delay = self.backoff(attempt);
            warn!(attempt, ?delay, error = %err, "LLM request rejected; retrying");
            sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.8,
            max_tokens: 800,
        }
    }
}

/// Request body for the chat-completion endpoint.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub do_sample: bool,
    pub stream: bool,
}

/// A single role-tagged message.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Response from the chat-completion endpoint; only the parts we read.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Trimmed content of the first choice, if it has any text.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// [`AskAsync`] implementation for a bearer-authenticated `chat/completions` API.
///
/// Every call sends the fixed system instruction followed by the caller's
/// text as the user message. The response is the first choice's content.
pub struct ChatCompletionClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    params: SamplingParams,
    timeout: StdDuration,
}

impl ChatCompletionClient {
    pub fn new(
        http: Client,
        endpoint: String,
        api_key: String,
        model: String,
        system_prompt: String,
        params: SamplingParams,
        timeout: StdDuration,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            model,
            system_prompt,
            params,
            timeout,
        }
    }

    pub fn request<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.params.temperature,
            top_p: self.params.top_p,
            max_tokens: self.params.max_tokens,
            do_sample: true,
            stream: false,
        }
    }
}

impl fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AskAsync for ChatCompletionClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, LlmError> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json;charset=UTF-8")
            .timeout(self.timeout)
            .json(&self.request(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = dt.as_millis(),
                body_preview = %truncate_for_log(&body, 200),
                "API call failed"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&body, 200),
            });
        }

        let content = parse_completion(&body)?;
        debug!(elapsed_ms = dt.as_millis(), chars = content.chars().count(), "API call succeeded");
        Ok(content)
    }
}

/// Extract the analysis text from a raw completion body.
pub fn parse_completion(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        LlmError::InvalidResponse(format!(
            "failed to parse response: {e}; body: {}",
            truncate_for_log(body, 200)
        ))
    })?;
    parsed
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("response has no choice content".to_string()))
}

/// Build the production LLM stack: a chat client wrapped in [`RetryAsk`].
pub fn build_llm(
    client: ChatCompletionClient,
    max_retries: usize,
    base_delay: StdDuration,
) -> RetryAsk<ChatCompletionClient> {
    info!(?client, max_retries, ?base_delay, "LLM client configured");
    RetryAsk::new(client, max_retries, base_delay)
}

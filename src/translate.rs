//! Best-effort machine translation.
//!
//! [`Translate`] is the raw, fallible capability; [`TextTranslator`] wraps it
//! with the policy the rest of the pipeline relies on:
//!
//! - empty input is returned as-is without calling the backend
//! - [`TextTranslator::translate`] never fails, it hands back the source text
//! - [`TextTranslator::try_translate`] reports failure as `None` for callers
//!   that pick a different fallback
//!
//! [`GoogleTranslate`] talks to the public `gtx` endpoint of Google Translate.

use crate::utils::truncate_for_log;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Errors from a translation backend.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation service returned status {0}")]
    Status(u16),

    #[error("malformed translation response: {0}")]
    Malformed(String),

    #[error("translation came back empty")]
    Empty,
}

/// A translation backend.
pub trait Translate {
    /// Translate `text` into `target_locale` (e.g. `"zh-TW"`).
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String, TranslateError>;
}

/// Failure-tolerant front end over a [`Translate`] backend.
#[derive(Debug, Clone)]
pub struct TextTranslator<T> {
    inner: T,
    target_locale: String,
}

impl<T> TextTranslator<T>
where
    T: Translate,
{
    pub fn new(inner: T, target_locale: impl Into<String>) -> Self {
        Self {
            inner,
            target_locale: target_locale.into(),
        }
    }

    pub fn target_locale(&self) -> &str {
        &self.target_locale
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Translate, or return `None` if the backend failed or produced nothing.
    ///
    /// Empty input yields `Some("")` without a backend call.
    pub async fn try_translate(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return Some(String::new());
        }
        match self.inner.translate(text, &self.target_locale).await {
            Ok(translated) if !translated.trim().is_empty() => Some(translated),
            Ok(_) => {
                warn!(
                    locale = %self.target_locale,
                    source_preview = %truncate_for_log(text, 50),
                    "Translation came back empty"
                );
                None
            }
            Err(e) => {
                warn!(
                    locale = %self.target_locale,
                    error = %e,
                    source_preview = %truncate_for_log(text, 50),
                    "Translation failed"
                );
                None
            }
        }
    }

    /// Translate, falling back to the untranslated input on any failure.
    pub async fn translate(&self, text: &str) -> String {
        self.try_translate(text)
            .await
            .unwrap_or_else(|| text.to_string())
    }
}

/// [`Translate`] backend using the Google Translate `gtx` web endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    http: Client,
    endpoint: String,
}

impl GoogleTranslate {
    pub fn new(http: Client, endpoint: String) -> Self {
        Self { http, endpoint }
    }
}

impl Translate for GoogleTranslate {
    #[instrument(level = "debug", skip_all, fields(%target_locale, chars = text.chars().count()))]
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String, TranslateError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_locale),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let translated = join_segments(&body)?;
        debug!(preview = %truncate_for_log(&translated, 50), "Translated text");
        Ok(translated)
    }
}

/// Join the translated segments of a `gtx` response.
///
/// The payload is a nested array whose first element lists one
/// `[translated, original, ...]` entry per sentence:
///
/// ```text
/// [[["你好。","Hello.",null,null,10],["世界","World",null,null,10]],null,"en"]
/// ```
fn join_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing sentence list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslateError::Empty);
    }
    Ok(translated)
}

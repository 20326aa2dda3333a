//! Data models for fetched articles and their analysed representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`] / [`NewsApiResponse`]: the news API payload as received
//! - [`Article`]: a filtered, render-worthy news item
//! - [`RawAnalysis`]: the Summarizer output before section parsing
//! - [`AnalysisSections`] / [`SectionKey`]: the four-part structured analysis
//! - [`Summary`]: one fully enriched, render-ready record
//!
//! The news API uses camelCase field names, hence the serde renames.

use serde::Deserialize;

/// Top-level body returned by the news search endpoint.
///
/// `status` is `"ok"` on success; on failure the API sets it to `"error"` and
/// fills `code`/`message` instead of `articles`.
#[derive(Debug, Deserialize)]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// An article exactly as the news API returned it.
///
/// Every field may be `null` upstream, so all of them are optional here.
/// Filtering into [`Article`] happens in [`crate::source::filter_articles`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

/// A news item that passed the post-fetch filter.
///
/// # Invariants
///
/// * `title` is non-empty and not the `"[Removed]"` sentinel
/// * `description` is longer than 50 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    /// Link to the original story, `"#"` when the API omitted it.
    pub url: String,
    /// ISO-8601 publish timestamp as sent by the API (may be empty).
    pub published_at: String,
}

/// What the Summarizer produced for one article, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnalysis {
    /// LLM output, translated fallback text, or a sentinel string.
    pub analysis_text: String,
    /// Translated title (or its fallback).
    pub title: String,
}

/// The four fixed analysis sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Highlights,
    Background,
    Impact,
    Insight,
}

impl SectionKey {
    /// All keys in prompt and display order.
    pub const ALL: [SectionKey; 4] = [
        SectionKey::Highlights,
        SectionKey::Background,
        SectionKey::Impact,
        SectionKey::Insight,
    ];

    /// The heading text shown in the prompt and the digest.
    pub fn label(self) -> &'static str {
        match self {
            SectionKey::Highlights => "新聞要點",
            SectionKey::Background => "背景分析",
            SectionKey::Impact => "影響評估",
            SectionKey::Insight => "專業見解",
        }
    }

    /// Numbered marker the model is asked to emit, e.g. `"1. 新聞要點"`.
    pub fn marker(self) -> &'static str {
        match self {
            SectionKey::Highlights => "1. 新聞要點",
            SectionKey::Background => "2. 背景分析",
            SectionKey::Impact => "3. 影響評估",
            SectionKey::Insight => "4. 專業見解",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SectionKey::Highlights => "📌",
            SectionKey::Background => "🔍",
            SectionKey::Impact => "💡",
            SectionKey::Insight => "🎯",
        }
    }
}

/// Structured breakdown of one article's analysis.
///
/// Each field may be empty: either the label was present with no content, or
/// the raw text carried no labels at all (the translation fallback).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSections {
    pub highlights: String,
    pub background: String,
    pub impact: String,
    pub insight: String,
}

impl AnalysisSections {
    pub fn get(&self, key: SectionKey) -> &str {
        match key {
            SectionKey::Highlights => &self.highlights,
            SectionKey::Background => &self.background,
            SectionKey::Impact => &self.impact,
            SectionKey::Insight => &self.insight,
        }
    }

    pub fn get_mut(&mut self, key: SectionKey) -> &mut String {
        match key {
            SectionKey::Highlights => &mut self.highlights,
            SectionKey::Background => &mut self.background,
            SectionKey::Impact => &mut self.impact,
            SectionKey::Insight => &mut self.insight,
        }
    }

    /// Iterate `(key, content)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &str)> {
        SectionKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    pub fn is_blank(&self) -> bool {
        self.iter().all(|(_, content)| content.trim().is_empty())
    }
}

/// A fully enriched, render-ready record for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Translated title.
    pub title: String,
    pub sections: AnalysisSections,
    pub url: String,
    pub published_at: String,
}

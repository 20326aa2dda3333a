//! Per-article enrichment: LLM analysis with a translation fallback.
//!
//! For each article the summarizer
//!
//! 1. asks the LLM for the four-section analysis,
//! 2. on any LLM failure, uses the translated description as the whole
//!    analysis (or a sentinel when there is nothing to translate or the
//!    translation fails),
//! 3. translates the title independently, falling back to the original title
//!    and then to a "no title" sentinel.
//!
//! Nothing in here returns an error: every failure is mapped to a fallback
//! value and logged, so one bad article never stops the run.

use crate::api::AskAsync;
use crate::models::{Article, RawAnalysis, Summary};
use crate::parser::SectionParser;
use crate::prompt::analysis_prompt;
use crate::throttle::Throttle;
use crate::translate::{TextTranslator, Translate};
use crate::utils::truncate_for_log;
use tracing::{info, instrument, warn};

/// Analysis text used when the LLM failed and the article has no description.
pub const CONTENT_UNAVAILABLE: &str = "無法獲取新聞內容";
/// Analysis text used when the LLM failed and translating the description failed too.
pub const SUMMARY_UNAVAILABLE: &str = "無法生成摘要";
/// Title used when neither a translated nor an original title is available.
pub const NO_TITLE: &str = "無標題";

pub struct Summarizer<L, T> {
    llm: L,
    translator: TextTranslator<T>,
    parser: SectionParser,
    throttle: Throttle,
}

impl<L, T> Summarizer<L, T>
where
    L: AskAsync<Response = String>,
    T: Translate,
{
    pub fn new(
        llm: L,
        translator: TextTranslator<T>,
        parser: SectionParser,
        throttle: Throttle,
    ) -> Self {
        Self {
            llm,
            translator,
            parser,
            throttle,
        }
    }

    /// Produce the raw analysis and translated title for one article.
    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(&article.title, 60)))]
    pub async fn summarize(&self, article: &Article) -> RawAnalysis {
        let analysis_text = match self.llm.ask(&analysis_prompt(article)).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(preview = %truncate_for_log(&text, 50), "Generated analysis");
                text
            }
            Ok(_) => {
                warn!("LLM returned an empty analysis; using fallback");
                self.fallback_analysis(article).await
            }
            Err(e) => {
                warn!(error = %e, "LLM analysis failed; using fallback");
                self.fallback_analysis(article).await
            }
        };

        let title = self.translated_title(article).await;

        RawAnalysis {
            analysis_text,
            title,
        }
    }

    async fn fallback_analysis(&self, article: &Article) -> String {
        if article.description.is_empty() {
            warn!("No description to fall back on");
            return CONTENT_UNAVAILABLE.to_string();
        }
        match self.translator.try_translate(&article.description).await {
            Some(translated) => {
                info!(
                    preview = %truncate_for_log(&translated, 50),
                    "Using translated description as analysis"
                );
                translated
            }
            None => {
                warn!("Fallback translation failed too");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    async fn translated_title(&self, article: &Article) -> String {
        // falls back to the original title on failure
        let title = self.translator.translate(&article.title).await;
        if title.trim().is_empty() {
            NO_TITLE.to_string()
        } else {
            title
        }
    }

    /// Enrich every article in order, pacing LLM work with the throttle.
    ///
    /// Returns exactly one [`Summary`] per input article, in input order.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize_all(&mut self, articles: &[Article]) -> Vec<Summary> {
        let mut summaries = Vec::with_capacity(articles.len());

        for (index, article) in articles.iter().enumerate() {
            self.throttle.ready().await;
            let raw = self.summarize(article).await;
            self.throttle.complete();

            let sections = self.parser.parse(&raw.analysis_text);
            if sections.is_blank() {
                warn!(index, "Analysis has no recognisable sections; card will be blank");
            }
            info!(index, total = articles.len(), "Article processed");

            summaries.push(Summary {
                title: raw.title,
                sections,
                url: article.url.clone(),
                published_at: article.published_at.clone(),
            });
        }

        summaries
    }
}

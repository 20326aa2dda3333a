//! The digest run: fetch → summarize → render → write.
//!
//! ```text
//! START → FETCH ─(no articles)──→ ABORT
//!              └→ SUMMARIZE_ALL ─(no summaries)──→ ABORT
//!                               └→ RENDER → WRITE → DONE
//! ```
//!
//! An aborted run never touches the output file, so a digest from an earlier
//! run stays in place. Only a failed write is an error.

use crate::api::AskAsync;
use crate::outputs::html::{render_digest, write_digest};
use crate::source::ArticleSource;
use crate::summarizer::Summarizer;
use crate::translate::Translate;
use chrono::Local;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Why a run stopped without producing a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NoArticles,
    NoSummaries,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::NoArticles => write!(f, "no articles fetched"),
            AbortReason::NoSummaries => write!(f, "no summaries produced"),
        }
    }
}

/// A digest that was rendered and written.
#[derive(Debug, Clone)]
pub struct Digest {
    pub path: PathBuf,
    pub html: String,
    pub cards: usize,
}

#[derive(Debug)]
pub enum RunOutcome {
    Aborted(AbortReason),
    Published(Digest),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to write digest to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct Pipeline<S, L, T> {
    source: S,
    summarizer: Summarizer<L, T>,
    output_path: PathBuf,
}

impl<S, L, T> Pipeline<S, L, T>
where
    S: ArticleSource,
    L: AskAsync<Response = String>,
    T: Translate,
{
    pub fn new(source: S, summarizer: Summarizer<L, T>, output_path: PathBuf) -> Self {
        Self {
            source,
            summarizer,
            output_path,
        }
    }

    /// Execute one run.
    #[instrument(level = "info", skip_all, fields(output = %self.output_path.display()))]
    pub async fn run(&mut self) -> Result<RunOutcome, PipelineError> {
        let t0 = Instant::now();

        let articles = self.source.fetch().await;
        if articles.is_empty() {
            warn!(reason = %AbortReason::NoArticles, "Aborting run; output left untouched");
            return Ok(RunOutcome::Aborted(AbortReason::NoArticles));
        }
        info!(count = articles.len(), "Processing articles");

        let summaries = self.summarizer.summarize_all(&articles).await;
        if summaries.is_empty() {
            warn!(reason = %AbortReason::NoSummaries, "Aborting run; output left untouched");
            return Ok(RunOutcome::Aborted(AbortReason::NoSummaries));
        }

        let html = render_digest(&summaries, Local::now().naive_local());
        if let Err(source) = write_digest(&self.output_path, &html).await {
            error!(error = %source, "Failed to write digest");
            return Err(PipelineError::Persistence {
                path: self.output_path.clone(),
                source,
            });
        }

        info!(
            cards = summaries.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Digest published"
        );
        Ok(RunOutcome::Published(Digest {
            path: self.output_path.clone(),
            html,
            cards: summaries.len(),
        }))
    }
}

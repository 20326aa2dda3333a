//! Entry point: resolve configuration, run the pipeline once, deliver.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... GLM_API_KEY=... tech_digest -o index.html
//! ```

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tech_digest::api::{ChatCompletionClient, SamplingParams, build_llm};
use tech_digest::cli::Cli;
use tech_digest::config::DigestConfig;
use tech_digest::outputs::mail::{digest_subject, send_digest};
use tech_digest::parser::SectionParser;
use tech_digest::pipeline::{Pipeline, RunOutcome};
use tech_digest::prompt::SYSTEM_PROMPT;
use tech_digest::source::NewsApiSource;
use tech_digest::summarizer::Summarizer;
use tech_digest::throttle::Throttle;
use tech_digest::translate::{GoogleTranslate, TextTranslator};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tech_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output, "Parsed CLI arguments");

    let config = match DigestConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    if args.email && config.mail.is_none() {
        warn!("--email given but EMAIL_ADDRESS or EMAIL_PASSWORD is missing; skipping e-mail");
    }

    // ---- Wire components ----
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;

    let source = NewsApiSource::new(
        http.clone(),
        config.news_endpoint.clone(),
        config.news_api_key.clone(),
    );
    let translator = TextTranslator::new(
        GoogleTranslate::new(http.clone(), config.translate_endpoint.clone()),
        config.target_locale.clone(),
    );
    let client = ChatCompletionClient::new(
        http,
        config.llm_endpoint.clone(),
        config.llm_api_key.clone(),
        config.model.clone(),
        SYSTEM_PROMPT.to_string(),
        SamplingParams {
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        },
        config.request_timeout(),
    );
    let llm = build_llm(client, config.max_retries, config.base_delay());

    let summarizer = Summarizer::new(
        llm,
        translator,
        SectionParser::for_mode(config.label_matching),
        Throttle::new(config.inter_article_delay()),
    );
    let mut pipeline = Pipeline::new(source, summarizer, config.output_path.clone());

    // ---- Run ----
    match pipeline.run().await? {
        RunOutcome::Aborted(reason) => {
            info!(%reason, "Run finished without a new digest");
        }
        RunOutcome::Published(digest) => {
            info!(path = %digest.path.display(), cards = digest.cards, "Digest ready");

            if let Some(mail) = &config.mail {
                let subject = digest_subject(Local::now().date_naive());
                if let Err(e) = send_digest(mail, &subject, &digest.html).await {
                    error!(error = %e, "Failed to e-mail digest");
                }
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

//! Command-line interface definitions for the digest runner.
//!
//! Secrets can be provided via flags or environment variables (a `.env` file
//! in the working directory is loaded first). Non-secret tuning lives in the
//! optional YAML file; the flags here override it.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one digest run.
///
/// # Examples
///
/// ```sh
/// # Keys from the environment, digest written to ./index.html
/// tech_digest
///
/// # Custom output path and tuning file
/// tech_digest -o public/index.html -c digest.yaml
///
/// # Also mail the digest to EMAIL_ADDRESS
/// tech_digest --email
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML tuning file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Where to write the HTML digest (default: index.html)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// News search API key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: String,

    /// Chat-completion API key (bearer token)
    #[arg(long, env = "GLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: String,

    /// Target locale for translated titles and fallback text (default: zh-TW)
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Minimum seconds between two analysed articles (default: 5)
    #[arg(long)]
    pub delay_secs: Option<u64>,

    /// Chat-completion model identifier (default: glm-4)
    #[arg(long)]
    pub model: Option<String>,

    /// Accept loosely formatted section labels in model output
    #[arg(long)]
    pub lenient_labels: bool,

    /// Also send the digest by e-mail
    #[arg(long)]
    pub email: bool,

    /// Sender and recipient address for the e-mail digest
    #[arg(long, env = "EMAIL_ADDRESS")]
    pub email_address: Option<String>,

    /// SMTP password for the e-mail digest
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,
}

//! Static HTML digest rendering.
//!
//! [`render_digest`] is pure: the same summaries and generation time always
//! give byte-identical output. [`write_digest`] is the only I/O and replaces
//! the previous file wholesale.
//!
//! # Layout
//!
//! ```text
//! header        date, "last updated" line
//! card × N      title, publish time, 4 sections (2×2 grid), link to source
//! ```

use crate::models::{SectionKey, Summary};
use crate::utils::escape_html;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

/// Shown when an article's timestamp cannot be parsed.
pub const TIME_UNKNOWN: &str = "發布時間未知";

const STYLESHEET: &str = r#"
body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 20px; background-color: #f5f5f5; }
.news-container { max-width: 900px; margin: 20px auto; }
.news-container h1 { text-align: center; color: #2c3e50; }
.last-update { text-align: center; color: #666; margin-bottom: 20px; }
.news-item { margin-bottom: 35px; border: 1px solid #eee; border-radius: 8px; background-color: #fff; box-shadow: 0 2px 4px rgba(0,0,0,0.1); overflow: hidden; }
.news-header { background-color: #f8f9fa; padding: 20px 25px; border-bottom: 1px solid #eee; }
.news-title { color: #2c3e50; margin: 0; font-size: 1.5em; line-height: 1.4; }
.news-meta { color: #666; font-size: 0.9em; margin-top: 8px; }
.news-content { padding: 25px; display: grid; grid-template-columns: repeat(2, 1fr); gap: 20px; }
.news-section { padding: 20px; border-radius: 8px; border: 1px solid #e1e8ed; transition: transform 0.2s ease, box-shadow 0.2s ease; }
.news-section:hover { transform: translateY(-2px); box-shadow: 0 4px 12px rgba(0,0,0,0.1); }
.section-title { color: #2980b9; font-size: 1.2em; margin-bottom: 12px; font-weight: bold; display: flex; align-items: center; gap: 8px; }
.section-content { color: #333; line-height: 1.8; font-size: 1.1em; text-align: justify; }
.news-footer { padding: 15px 25px; background-color: #f8f9fa; border-top: 1px solid #eee; text-align: right; }
.news-link { color: #3498db; text-decoration: none; font-weight: bold; display: inline-block; padding: 8px 20px; border: 2px solid #3498db; border-radius: 6px; transition: all 0.3s ease; }
.news-link:hover { background-color: #3498db; color: white; }
@media (max-width: 768px) { .news-content { grid-template-columns: 1fr; } }
"#;

/// Format an ISO-8601 publish timestamp as `YYYY-MM-DD HH:MM`.
///
/// A trailing `Z` is read as `+00:00`, and the time is shown in the
/// timestamp's own offset. Offset-less and date-only values are accepted as
/// written. Anything else becomes [`TIME_UNKNOWN`].
pub fn format_published(raw: &str) -> String {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{stem}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    for pattern in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, pattern) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return date.and_time(NaiveTime::MIN).format("%Y-%m-%d %H:%M").to_string();
    }

    debug!(raw, "Unparseable publish timestamp");
    TIME_UNKNOWN.to_string()
}

/// Only absolute http(s) links are emitted; anything else points nowhere.
fn safe_href(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => escape_html(url),
        _ => "#".to_string(),
    }
}

fn render_card(summary: &Summary) -> String {
    let mut card = String::new();
    card.push_str("<div class=\"news-item\">\n");
    card.push_str("<div class=\"news-header\">\n");
    card.push_str(&format!(
        "<h3 class=\"news-title\">{}</h3>\n",
        escape_html(&summary.title)
    ));
    card.push_str(&format!(
        "<div class=\"news-meta\">📅 發布時間：{}</div>\n",
        escape_html(&format_published(&summary.published_at))
    ));
    card.push_str("</div>\n");

    card.push_str("<div class=\"news-content\">\n");
    for key in SectionKey::ALL {
        card.push_str(&format!(
            "<div class=\"news-section\">\n<div class=\"section-title\"><span class=\"section-icon\">{}</span><span>{}</span></div>\n<div class=\"section-content\">{}</div>\n</div>\n",
            key.icon(),
            key.label(),
            escape_html(summary.sections.get(key)),
        ));
    }
    card.push_str("</div>\n");

    card.push_str(&format!(
        "<div class=\"news-footer\"><a href=\"{}\" class=\"news-link\" target=\"_blank\" rel=\"noopener noreferrer\">閱讀原文 →</a></div>\n",
        safe_href(&summary.url)
    ));
    card.push_str("</div>\n");
    card
}

/// Render the complete digest document.
///
/// `generated_at` supplies both the page date and the "last updated" line, so
/// callers control the only time-dependent part of the output.
pub fn render_digest(summaries: &[Summary], generated_at: NaiveDateTime) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"zh-TW\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!(
        "<title>每日科技新聞摘要 - {}</title>\n",
        generated_at.format("%Y-%m-%d")
    ));
    html.push_str(&format!("<style>{STYLESHEET}</style>\n"));
    html.push_str("</head>\n<body>\n<div class=\"news-container\">\n");
    html.push_str("<h1>每日科技新聞深度分析</h1>\n");
    html.push_str(&format!(
        "<p class=\"last-update\">最後更新時間：{}</p>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    for summary in summaries {
        html.push_str(&render_card(summary));
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Write the digest to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, html).await?;
    info!(bytes = html.len(), "Wrote HTML digest");
    Ok(())
}

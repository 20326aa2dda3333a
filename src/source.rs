//! Article discovery through the news search API.
//!
//! The source asks for the 20 newest English technology/business stories from
//! a fixed set of trusted outlets and filters out items that cannot produce a
//! useful analysis. It never fails: any transport or API error is logged and
//! turned into an empty result, which the pipeline treats as "nothing to do".

use crate::models::{Article, NewsApiResponse, RawArticle};
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

/// Free-text query sent to the search endpoint.
pub const QUERY: &str = "technology OR business";
pub const LANGUAGE: &str = "en";
pub const PAGE_SIZE: u32 = 20;
pub const SORT_BY: &str = "publishedAt";
/// Outlets whose stories are eligible for the digest.
pub const TRUSTED_DOMAINS: [&str; 5] = [
    "techcrunch.com",
    "theverge.com",
    "engadget.com",
    "reuters.com",
    "bloomberg.com",
];
/// Title the API substitutes for deleted articles.
pub const REMOVED_SENTINEL: &str = "[Removed]";
/// Descriptions must be strictly longer than this many characters.
pub const MIN_DESCRIPTION_CHARS: usize = 50;

/// Errors that make a fetch come back empty.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news API returned status {0}")]
    Status(u16),

    #[error("news API reported an error ({code}): {message}")]
    Api { code: String, message: String },
}

/// Something that can supply candidate articles for one run.
pub trait ArticleSource {
    /// Fetch and filter articles, newest first. Never fails; an unavailable
    /// source yields an empty vector.
    async fn fetch(&self) -> Vec<Article>;
}

/// [`ArticleSource`] backed by the `newsapi.org` `/v2/everything` endpoint.
#[derive(Debug, Clone)]
pub struct NewsApiSource {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl NewsApiSource {
    pub fn new(http: Client, endpoint: String, api_key: String) -> Self {
        Self {
            http,
            endpoint,
            api_key,
        }
    }

    /// Query parameters for the search request, in a stable order.
    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("apiKey", self.api_key.clone()),
            ("language", LANGUAGE.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("sortBy", SORT_BY.to_string()),
            ("q", QUERY.to_string()),
            ("domains", TRUSTED_DOMAINS.join(",")),
        ]
    }

    async fn try_fetch(&self) -> Result<Vec<RawArticle>, SourceError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&self.query_params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: NewsApiResponse = response.json().await?;
        debug!(status = %body.status, count = body.articles.len(), "News API responded");
        if body.status != "ok" {
            return Err(SourceError::Api {
                code: body.code.unwrap_or_else(|| body.status.clone()),
                message: body.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(body.articles)
    }
}

impl ArticleSource for NewsApiSource {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Vec<Article> {
        match self.try_fetch().await {
            Ok(raw) => {
                let fetched = raw.len();
                let articles = filter_articles(raw);
                info!(
                    fetched,
                    kept = articles.len(),
                    "Fetched news articles"
                );
                articles
            }
            Err(SourceError::Api { code, message }) => {
                warn!(%code, %message, "News API returned an error; treating as no articles");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "News fetch failed; treating as no articles");
                Vec::new()
            }
        }
    }
}

/// Keep only articles that can be analysed, preserving API order.
///
/// An article survives when its title is non-empty and not
/// [`REMOVED_SENTINEL`], and its description is longer than
/// [`MIN_DESCRIPTION_CHARS`] characters.
pub fn filter_articles(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| {
            let title = item.title.filter(|t| !t.is_empty() && t != REMOVED_SENTINEL)?;
            let description = item
                .description
                .filter(|d| d.chars().count() > MIN_DESCRIPTION_CHARS)?;
            Some(Article {
                title,
                description,
                url: item
                    .url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| "#".to_string()),
                published_at: item.published_at.unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedServer, direct_client};

    fn raw(title: Option<&str>, description: Option<&str>) -> RawArticle {
        RawArticle {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            url: Some("https://techcrunch.com/story".to_string()),
            published_at: Some("2024-01-05T10:00:00Z".to_string()),
        }
    }

    fn long_description() -> String {
        "x".repeat(MIN_DESCRIPTION_CHARS + 1)
    }

    #[test]
    fn test_filter_keeps_valid_articles_in_order() {
        let desc = long_description();
        let articles = filter_articles(vec![
            raw(Some("first"), Some(&desc)),
            raw(Some("second"), Some(&desc)),
        ]);
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(articles[0].published_at, "2024-01-05T10:00:00Z");
    }

    #[test]
    fn test_filter_drops_invalid_articles() {
        let desc = long_description();
        let exactly_fifty = "y".repeat(MIN_DESCRIPTION_CHARS);
        let articles = filter_articles(vec![
            raw(None, Some(&desc)),
            raw(Some(""), Some(&desc)),
            raw(Some(REMOVED_SENTINEL), Some(&desc)),
            raw(Some("no description"), None),
            raw(Some("empty description"), Some("")),
            raw(Some("fifty chars"), Some(&exactly_fifty)),
            raw(Some("keeper"), Some(&desc)),
        ]);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "keeper");
    }

    #[test]
    fn test_filter_counts_characters_not_bytes() {
        // 20 CJK characters are 60 bytes but only 20 characters.
        let cjk = "新".repeat(20);
        assert!(filter_articles(vec![raw(Some("t"), Some(&cjk))]).is_empty());

        let cjk = "新".repeat(51);
        assert_eq!(filter_articles(vec![raw(Some("t"), Some(&cjk))]).len(), 1);
    }

    #[test]
    fn test_filter_defaults_missing_fields() {
        let mut item = raw(Some("t"), Some(&long_description()));
        item.url = None;
        item.published_at = None;
        let articles = filter_articles(vec![item]);
        assert_eq!(articles[0].url, "#");
        assert_eq!(articles[0].published_at, "");
    }

    #[test]
    fn test_filter_invariants_hold_for_every_output() {
        let desc = long_description();
        let inputs: Vec<RawArticle> = [
            Some("a"),
            None,
            Some(REMOVED_SENTINEL),
            Some(""),
            Some("b"),
        ]
        .iter()
        .flat_map(|t| {
            [None, Some(""), Some("short"), Some(desc.as_str())]
                .into_iter()
                .map(move |d| raw(*t, d))
        })
        .collect();

        for article in filter_articles(inputs) {
            assert!(!article.title.is_empty());
            assert_ne!(article.title, REMOVED_SENTINEL);
            assert!(article.description.chars().count() > MIN_DESCRIPTION_CHARS);
        }
    }

    #[test]
    fn test_query_params() {
        let source = NewsApiSource::new(
            Client::new(),
            "http://localhost/v2/everything".to_string(),
            "key".to_string(),
        );
        let params = source.query_params();
        assert!(params.contains(&("apiKey", "key".to_string())));
        assert!(params.contains(&("pageSize", "20".to_string())));
        assert!(params.contains(&("sortBy", "publishedAt".to_string())));
        assert!(params.contains(&("q", "technology OR business".to_string())));
        assert!(params.contains(&(
            "domains",
            "techcrunch.com,theverge.com,engadget.com,reuters.com,bloomberg.com".to_string()
        )));
    }

    #[tokio::test]
    async fn test_unreachable_source_yields_no_articles() {
        let source = NewsApiSource::new(
            direct_client(),
            "http://127.0.0.1:9/v2/everything".to_string(),
            "key".to_string(),
        );
        assert!(source.fetch().await.is_empty());
    }

    fn source_for(server: &CannedServer) -> NewsApiSource {
        NewsApiSource::new(
            direct_client(),
            server.url("/v2/everything"),
            "key".to_string(),
        )
    }

    #[tokio::test]
    async fn test_fetch_filters_live_response() {
        let server = CannedServer::replying(
            200,
            r#"{"status":"ok","totalResults":3,"articles":[
                {"source":{"id":null,"name":"The Verge"},"title":"Kept story","description":"A description comfortably longer than fifty characters in total.","url":"https://www.theverge.com/a","publishedAt":"2024-01-05T10:00:00Z"},
                {"title":"[Removed]","description":"[Removed]","url":"https://removed.com","publishedAt":"1970-01-01T00:00:00Z"},
                {"title":"Short one","description":"too short","url":"https://techcrunch.com/b","publishedAt":"2024-01-05T09:00:00Z"}
            ]}"#,
        )
        .await;

        let articles = source_for(&server).fetch().await;

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept story");
        assert_eq!(articles[0].url, "https://www.theverge.com/a");

        let request = &server.requests()[0];
        assert!(request.starts_with("GET /v2/everything?"));
        assert!(request.contains("pageSize=20"));
        assert!(request.contains("sortBy=publishedAt"));
        assert!(request.contains("language=en"));
    }

    #[tokio::test]
    async fn test_error_status_yields_no_articles() {
        let server = CannedServer::replying(
            401,
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#,
        )
        .await;
        assert!(source_for(&server).fetch().await.is_empty());
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_api_error_body_yields_no_articles() {
        let server = CannedServer::replying(
            200,
            r#"{"status":"error","code":"rateLimited","message":"Too many requests."}"#,
        )
        .await;
        let source = source_for(&server);

        assert!(matches!(
            source.try_fetch().await,
            Err(SourceError::Api { ref code, .. }) if code == "rateLimited"
        ));
        assert!(source.fetch().await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_body_yields_no_articles() {
        let server = CannedServer::replying(200, "<html>gateway</html>").await;
        let source = source_for(&server);

        assert!(matches!(source.try_fetch().await, Err(SourceError::Http(_))));
        assert!(source.fetch().await.is_empty());
    }
}

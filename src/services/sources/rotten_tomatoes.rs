// Rotten Tomatoes rating source (optional)
// Scores are scraped from the movie page at https://www.rottentomatoes.com/m/<slug>.
// Newer pages embed a scorecard JSON blob; older ones carry score attributes
// on the score board element. Both are understood.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;

use super::{http_client, slugify, RatingProvider, RawScore, RawSourceResult, SourcePayload};
use crate::models::RatingSource;

const ROTTEN_TOMATOES_BASE: &str = "https://www.rottentomatoes.com";

static RE_CRITICS_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""criticsScore"\s*:\s*\{[^{}]*?"score"\s*:\s*"?(\d{1,3})"#).unwrap()
});
static RE_AUDIENCE_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""audienceScore"\s*:\s*\{[^{}]*?"score"\s*:\s*"?(\d{1,3})"#).unwrap()
});
static RE_CRITICS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tomatometerscore="(\d{1,3})""#).unwrap());
static RE_AUDIENCE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"audiencescore="(\d{1,3})""#).unwrap());

/// Rotten Tomatoes movie page scraper
pub struct RottenTomatoesClient {
    client: Client,
    base_url: String,
}

impl RottenTomatoesClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: ROTTEN_TOMATOES_BASE.to_string(),
        }
    }

    fn movie_url(&self, title: &str) -> Option<String> {
        let slug = slugify(title, '_');
        if slug.is_empty() {
            return None;
        }
        Some(format!("{}/m/{}", self.base_url, slug))
    }
}

fn first_capture(html: &str, patterns: &[&Regex]) -> Option<f64> {
    patterns.iter().find_map(|re| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })
}

/// Extract critic (Tomatometer) and audience percentages from a movie page
pub fn parse_movie_page(html: &str) -> RawScore {
    RawScore::Percentages {
        critic: first_capture(html, &[&*RE_CRITICS_JSON, &*RE_CRITICS_ATTR]),
        audience: first_capture(html, &[&*RE_AUDIENCE_JSON, &*RE_AUDIENCE_ATTR]),
    }
}

#[async_trait]
impl RatingProvider for RottenTomatoesClient {
    fn source(&self) -> RatingSource {
        RatingSource::RottenTomatoes
    }

    async fn fetch(&self, title: &str) -> RawSourceResult {
        let Some(url) = self.movie_url(title) else {
            return RawSourceResult::NotFound;
        };

        tracing::debug!("Rotten Tomatoes scrape: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RawSourceResult::Unavailable(format!(
                    "Failed to reach Rotten Tomatoes: {}",
                    e
                ))
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            return RawSourceResult::NotFound;
        }
        if !response.status().is_success() {
            return RawSourceResult::Unavailable(format!(
                "Rotten Tomatoes returned {}",
                response.status()
            ));
        }

        match response.text().await {
            Ok(html) => RawSourceResult::Found(SourcePayload::with_score(parse_movie_page(&html))),
            Err(e) => RawSourceResult::Unavailable(format!(
                "Failed to read Rotten Tomatoes page: {}",
                e
            )),
        }
    }

    async fn check_health(&self) -> bool {
        match self.client.head(&self.base_url).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(e) => {
                tracing::debug!("Rotten Tomatoes health check failed: {}", e);
                false
            }
        }
    }
}

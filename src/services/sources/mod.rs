// Rating source adapters
// Each adapter hides its provider's wire format behind RatingProvider and
// reports one of a small set of tagged outcomes.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::models::RatingSource;

pub mod letterboxd;
pub mod omdb;
pub mod rotten_tomatoes;

#[cfg(test)]
pub mod stub;

const USER_AGENT: &str = concat!("movie-score-aggregator/", env!("CARGO_PKG_VERSION"));

/// A rating in the provider's native scale
#[derive(Debug, Clone, PartialEq)]
pub enum RawScore {
    /// 0-10 rating as text, e.g. "8.5" or "N/A"
    TenPoint(Option<String>),
    /// 0-5 star average
    FivePoint(Option<f64>),
    /// Critic and audience percentages (0-100)
    Percentages {
        critic: Option<f64>,
        audience: Option<f64>,
    },
}

/// What a provider knows about a title besides its rating
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePayload {
    pub score: RawScore,
    pub title: Option<String>,
    pub year: Option<String>,
    pub poster_url: Option<String>,
}

impl SourcePayload {
    pub fn with_score(score: RawScore) -> Self {
        Self {
            score,
            title: None,
            year: None,
            poster_url: None,
        }
    }
}

/// Outcome of a single provider fetch
#[derive(Debug, Clone, PartialEq)]
pub enum RawSourceResult {
    Found(SourcePayload),
    /// The provider answered and does not know the title
    NotFound,
    /// Network failure, timeout, or an unexpected response
    Unavailable(String),
    /// Required credentials are missing or rejected
    NotConfigured(String),
}

/// Uniform interface over an external rating provider
#[async_trait]
pub trait RatingProvider: Send + Sync {
    fn source(&self) -> RatingSource;

    /// Look up ratings for a title. Never fails; problems are reported as
    /// tagged outcomes.
    async fn fetch(&self, title: &str) -> RawSourceResult;

    /// Cheap reachability probe used by `/health`
    async fn check_health(&self) -> bool;
}

/// Build the HTTP client shared by the scraping and API adapters
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Turn a title into the URL slug style used by Letterboxd and
/// Rotten Tomatoes: lowercase ASCII alphanumerics joined by `separator`.
/// Apostrophes are dropped rather than split on ("schindler's" -> "schindlers").
pub fn slugify(title: &str, separator: char) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.trim().chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(separator);
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

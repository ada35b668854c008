// Letterboxd rating source
// There is no public API; ratings come from the JSON-LD block embedded in
// each film page (https://letterboxd.com/film/<slug>/).

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;

use super::{http_client, slugify, RatingProvider, RawScore, RawSourceResult, SourcePayload};
use crate::models::RatingSource;

const LETTERBOXD_BASE: &str = "https://letterboxd.com";

static RE_RATING_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""ratingValue"\s*:\s*"?([0-9]+(?:\.[0-9]+)?)"#).unwrap());
static RE_OG_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta\s+property="og:title"\s+content="([^"]+)""#).unwrap());
static RE_TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\((\d{4})\)\s*$").unwrap());
static RE_FILM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta\s+property="og:type"\s+content="video\.movie""#).unwrap());

/// Letterboxd film page scraper
pub struct LetterboxdClient {
    client: Client,
    base_url: String,
}

impl LetterboxdClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: LETTERBOXD_BASE.to_string(),
        }
    }

    fn film_url(&self, title: &str) -> Option<String> {
        let slug = slugify(title, '-');
        if slug.is_empty() {
            return None;
        }
        Some(format!("{}/film/{}/", self.base_url, slug))
    }
}

/// Extract the average rating and title from a film page.
/// Returns None when the page is not a film page at all.
pub fn parse_film_page(html: &str) -> Option<SourcePayload> {
    if !RE_FILM_MARKER.is_match(html) && !html.contains("\"ratingValue\"") {
        return None;
    }

    // Films with too few ratings have no ratingValue; that is a real film
    // without a score, not a missing film.
    let rating = RE_RATING_VALUE
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let (title, year) = match RE_OG_TITLE.captures(html).and_then(|c| c.get(1)) {
        Some(m) => {
            let raw = html_decode(m.as_str());
            match RE_TITLE_YEAR.captures(&raw) {
                Some(c) => (Some(c[1].to_string()), Some(c[2].to_string())),
                None => (Some(raw), None),
            }
        }
        None => (None, None),
    };

    Some(SourcePayload {
        score: RawScore::FivePoint(rating),
        title,
        year,
        poster_url: None,
    })
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[async_trait]
impl RatingProvider for LetterboxdClient {
    fn source(&self) -> RatingSource {
        RatingSource::Letterboxd
    }

    async fn fetch(&self, title: &str) -> RawSourceResult {
        let Some(url) = self.film_url(title) else {
            return RawSourceResult::NotFound;
        };

        tracing::debug!("Letterboxd scrape: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RawSourceResult::Unavailable(format!("Failed to reach Letterboxd: {}", e))
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            return RawSourceResult::NotFound;
        }
        if !response.status().is_success() {
            return RawSourceResult::Unavailable(format!(
                "Letterboxd returned {}",
                response.status()
            ));
        }

        match response.text().await {
            Ok(html) => match parse_film_page(&html) {
                Some(payload) => RawSourceResult::Found(payload),
                None => RawSourceResult::NotFound,
            },
            Err(e) => {
                RawSourceResult::Unavailable(format!("Failed to read Letterboxd page: {}", e))
            }
        }
    }

    async fn check_health(&self) -> bool {
        // Any answer short of a server error means the site is reachable
        match self.client.head(&self.base_url).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(e) => {
                tracing::warn!("Letterboxd health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILM_PAGE: &str = r#"<html><head>
<meta property="og:type" content="video.movie" />
<meta property="og:title" content="The Departed (2006)" />
<script type="application/ld+json">
/* <![CDATA[ */
{"@type":"Movie","name":"The Departed","aggregateRating":{"@type":"aggregateRating","bestRating":5,"ratingValue":4.31,"ratingCount":812345}}
/* ]]> */
</script></head><body></body></html>"#;

    #[test]
    fn test_parse_film_page() {
        let payload = parse_film_page(FILM_PAGE).unwrap();
        assert_eq!(payload.score, RawScore::FivePoint(Some(4.31)));
        assert_eq!(payload.title.as_deref(), Some("The Departed"));
        assert_eq!(payload.year.as_deref(), Some("2006"));
    }

    #[test]
    fn test_film_without_enough_ratings() {
        let html = r#"<meta property="og:type" content="video.movie" />
<meta property="og:title" content="Tom &amp; Jerry" />"#;
        let payload = parse_film_page(html).unwrap();
        assert_eq!(payload.score, RawScore::FivePoint(None));
        assert_eq!(payload.title.as_deref(), Some("Tom & Jerry"));
        assert!(payload.year.is_none());
    }

    #[test]
    fn test_non_film_page() {
        assert!(parse_film_page("<html><title>Letterboxd</title></html>").is_none());
    }

    #[test]
    fn test_film_url() {
        let client = LetterboxdClient::new(Duration::from_secs(1));
        assert_eq!(
            client.film_url("The Departed").as_deref(),
            Some("https://letterboxd.com/film/the-departed/")
        );
        assert!(client.film_url("???").is_none());
    }
}

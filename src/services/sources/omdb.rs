// OMDb rating source (IMDb ratings)
// API Documentation: https://www.omdbapi.com/

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{http_client, RatingProvider, RawScore, RawSourceResult, SourcePayload};
use crate::models::RatingSource;

const OMDB_API_BASE: &str = "https://www.omdbapi.com/";
// Guardians of the Galaxy Vol. 2, a title OMDb always resolves
const HEALTH_CHECK_IMDB_ID: &str = "tt3896198";

pub const MISSING_API_KEY: &str = "OMDB API key not configured";

/// OMDb API client
pub struct OmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// Subset of the OMDb title response we use
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbTitle {
    pub title: Option<String>,
    pub year: Option<String>,
    pub poster: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl OmdbClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OMDB_API_BASE.to_string(),
        }
    }

    fn title_url(&self, title: &str, api_key: &str) -> String {
        format!(
            "{}?t={}&apikey={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(api_key)
        )
    }
}

/// Map an OMDb HTTP status and body onto a source outcome
pub fn interpret_response(status: StatusCode, body: &str) -> RawSourceResult {
    let parsed: OmdbTitle = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            if !status.is_success() {
                return RawSourceResult::Unavailable(format!("OMDb returned {}", status));
            }
            return RawSourceResult::Unavailable(format!("Failed to parse OMDb response: {}", e));
        }
    };

    // OMDb reports lookup failures in-band with Response=False
    let failed = parsed
        .response
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("false"));

    if let Some(error) = parsed.error.filter(|_| failed || !status.is_success()) {
        let lowered = error.to_lowercase();
        if lowered.contains("not found") {
            return RawSourceResult::NotFound;
        }
        if lowered.contains("api key") {
            return RawSourceResult::NotConfigured(format!("OMDb rejected API key: {}", error));
        }
        return RawSourceResult::Unavailable(error);
    }

    if !status.is_success() {
        return RawSourceResult::Unavailable(format!("OMDb returned {}", status));
    }

    RawSourceResult::Found(SourcePayload {
        score: RawScore::TenPoint(parsed.imdb_rating),
        title: parsed.title,
        year: not_applicable_to_none(parsed.year),
        poster_url: not_applicable_to_none(parsed.poster),
    })
}

fn not_applicable_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

#[async_trait]
impl RatingProvider for OmdbClient {
    fn source(&self) -> RatingSource {
        RatingSource::Imdb
    }

    async fn fetch(&self, title: &str) -> RawSourceResult {
        let Some(ref api_key) = self.api_key else {
            return RawSourceResult::NotConfigured(MISSING_API_KEY.to_string());
        };

        tracing::debug!("OMDb lookup: {}", title);

        let response = match self.client.get(self.title_url(title, api_key)).send().await {
            Ok(response) => response,
            Err(e) => return RawSourceResult::Unavailable(format!("Failed to reach OMDb: {}", e)),
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => interpret_response(status, &body),
            Err(e) => RawSourceResult::Unavailable(format!("Failed to read OMDb response: {}", e)),
        }
    }

    async fn check_health(&self) -> bool {
        let Some(ref api_key) = self.api_key else {
            return false;
        };

        let url = format!(
            "{}?i={}&apikey={}",
            self.base_url,
            HEALTH_CHECK_IMDB_ID,
            urlencoding::encode(api_key)
        );

        match self.client.get(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::warn!("OMDb health check failed: {}", e);
                false
            }
        }
    }
}

// Aggregation engine
// Fans out to every rating source at once, then applies failure precedence to
// the joined outcomes:
//   1. Letterboxd "not found" fails the lookup (exact-match existence check)
//   2. Rotten Tomatoes problems of any kind degrade to absent scores
//   3. OMDb missing credentials or "not found" fails the lookup
// The aggregate is the mean of whatever normalized scores are present.

use std::sync::Arc;
use std::time::Duration;

use super::normalize::{normalize, percentage};
use super::sources::{RatingProvider, RawScore, RawSourceResult, SourcePayload};
use crate::error::{AggregateError, Result};
use crate::models::{AggregateResult, RatingSource, RottenTomatoesScores, Score};

pub struct Aggregator {
    imdb: Arc<dyn RatingProvider>,
    letterboxd: Arc<dyn RatingProvider>,
    rotten_tomatoes: Option<Arc<dyn RatingProvider>>,
    source_timeout: Duration,
}

/// Reachability of one source, as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DependencyStatus {
    pub source: RatingSource,
    pub healthy: bool,
}

/// Mean of the present scores, rounded to two decimals
pub fn mean_of_present(scores: &[Option<Score>]) -> Option<Score> {
    let present: Vec<f64> = scores.iter().flatten().map(|s| s.value()).collect();
    if present.is_empty() {
        return None;
    }
    Score::new(present.iter().sum::<f64>() / present.len() as f64).map(|s| s.rounded())
}

impl Aggregator {
    pub fn new(
        imdb: Arc<dyn RatingProvider>,
        letterboxd: Arc<dyn RatingProvider>,
        rotten_tomatoes: Option<Arc<dyn RatingProvider>>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            imdb,
            letterboxd,
            rotten_tomatoes,
            source_timeout,
        }
    }

    /// Fetch from a provider, treating a timeout as unavailability
    async fn fetch_bounded(&self, provider: &dyn RatingProvider, title: &str) -> RawSourceResult {
        match tokio::time::timeout(self.source_timeout, provider.fetch(title)).await {
            Ok(outcome) => outcome,
            Err(_) => RawSourceResult::Unavailable(format!(
                "no response within {:?}",
                self.source_timeout
            )),
        }
    }

    /// Combine ratings for `title` from every configured source
    pub async fn aggregate(&self, title: &str) -> Result<AggregateResult> {
        let secondary = async {
            match self.rotten_tomatoes {
                Some(ref provider) => Some(self.fetch_bounded(provider.as_ref(), title).await),
                None => None,
            }
        };

        let (letterboxd, rotten_tomatoes, imdb) = tokio::join!(
            self.fetch_bounded(self.letterboxd.as_ref(), title),
            secondary,
            self.fetch_bounded(self.imdb.as_ref(), title),
        );

        let letterboxd = require(RatingSource::Letterboxd, title, letterboxd)?;
        let rotten_tomatoes = rotten_tomatoes.map(|outcome| secondary_scores(title, outcome));
        let imdb = require(RatingSource::Imdb, title, imdb)?;

        let imdb_score = normalize(RatingSource::Imdb, &imdb.score);
        let letterboxd_score = normalize(RatingSource::Letterboxd, &letterboxd.score);
        let secondary_score = rotten_tomatoes.as_ref().and_then(|rt| rt.aggregate_score);

        let aggregate_score = mean_of_present(&[imdb_score, letterboxd_score, secondary_score])
            .ok_or_else(|| {
                tracing::info!("No source has a rating for '{}'", title);
                AggregateError::NotFound(format!("No ratings available for movie '{}'", title))
            })?;

        tracing::info!(
            "Aggregated '{}': imdb={:?} letterboxd={:?} rotten_tomatoes={:?} -> {}",
            title,
            imdb_score.map(|s| s.value()),
            letterboxd_score.map(|s| s.value()),
            secondary_score.map(|s| s.value()),
            aggregate_score.value()
        );

        Ok(AggregateResult {
            title: imdb
                .title
                .or(letterboxd.title)
                .unwrap_or_else(|| title.to_string()),
            imdb_score,
            letterboxd_score,
            rotten_tomatoes,
            aggregate_score,
            year: imdb.year.or(letterboxd.year),
            poster_url: imdb.poster_url.or(letterboxd.poster_url),
        })
    }

    /// Probe every source concurrently
    pub async fn check_dependencies(&self) -> Vec<DependencyStatus> {
        let secondary = async {
            match self.rotten_tomatoes {
                Some(ref provider) => Some(provider.check_health().await),
                None => None,
            }
        };

        let (imdb, letterboxd, rotten_tomatoes) = tokio::join!(
            self.imdb.check_health(),
            self.letterboxd.check_health(),
            secondary,
        );

        let mut statuses = vec![
            DependencyStatus {
                source: RatingSource::Imdb,
                healthy: imdb,
            },
            DependencyStatus {
                source: RatingSource::Letterboxd,
                healthy: letterboxd,
            },
        ];
        if let Some(healthy) = rotten_tomatoes {
            statuses.push(DependencyStatus {
                source: RatingSource::RottenTomatoes,
                healthy,
            });
        }
        statuses
    }
}

/// Unwrap a mandatory source's outcome or turn it into a lookup failure
fn require(source: RatingSource, title: &str, outcome: RawSourceResult) -> Result<SourcePayload> {
    match outcome {
        RawSourceResult::Found(payload) => Ok(payload),
        RawSourceResult::NotFound => {
            tracing::info!("Movie '{}' not found on {}", title, source);
            Err(AggregateError::not_found_on(title, source))
        }
        RawSourceResult::Unavailable(message) => {
            tracing::error!("{} unavailable for '{}': {}", source, title, message);
            Err(AggregateError::UpstreamUnavailable {
                provider: source,
                message,
            })
        }
        RawSourceResult::NotConfigured(message) => {
            tracing::error!("{} is not configured: {}", source, message);
            Err(AggregateError::UpstreamConfig(message))
        }
    }
}

/// Rotten Tomatoes scores, absent on any failure
fn secondary_scores(title: &str, outcome: RawSourceResult) -> RottenTomatoesScores {
    let payload = match outcome {
        RawSourceResult::Found(payload) => payload,
        RawSourceResult::NotFound => {
            tracing::warn!("Movie '{}' not found on Rotten Tomatoes", title);
            return RottenTomatoesScores::absent();
        }
        RawSourceResult::Unavailable(message) | RawSourceResult::NotConfigured(message) => {
            tracing::warn!("Rotten Tomatoes skipped for '{}': {}", title, message);
            return RottenTomatoesScores::absent();
        }
    };

    let (critic, audience) = match payload.score {
        RawScore::Percentages { critic, audience } => (percentage(critic), percentage(audience)),
        _ => (None, None),
    };

    RottenTomatoesScores {
        critic_score: critic,
        audience_score: audience,
        aggregate_score: normalize(RatingSource::RottenTomatoes, &payload.score),
    }
}

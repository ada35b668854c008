// In-memory rating provider for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{RatingProvider, RawScore, RawSourceResult, SourcePayload};
use crate::models::RatingSource;

pub struct StubProvider {
    source: RatingSource,
    outcome: Mutex<RawSourceResult>,
    delay: Option<Duration>,
    healthy: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(source: RatingSource, outcome: RawSourceResult) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Mutex::new(outcome),
            delay: None,
            healthy: true,
            calls: AtomicUsize::new(0),
        })
    }

    /// A provider that answers only after `delay`
    pub fn slow(source: RatingSource, outcome: RawSourceResult, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Mutex::new(outcome),
            delay: Some(delay),
            healthy: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unhealthy(source: RatingSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Mutex::new(RawSourceResult::Unavailable("down".to_string())),
            delay: None,
            healthy: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn found(source: RatingSource, score: RawScore) -> Arc<Self> {
        Self::new(source, RawSourceResult::Found(SourcePayload::with_score(score)))
    }

    pub fn set_outcome(&self, outcome: RawSourceResult) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RatingProvider for StubProvider {
    fn source(&self) -> RatingSource {
        self.source
    }

    async fn fetch(&self, _title: &str) -> RawSourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }

    async fn check_health(&self) -> bool {
        self.healthy
    }
}

/// OMDb-shaped payload for "The Departed"
pub fn imdb_departed() -> RawSourceResult {
    RawSourceResult::Found(SourcePayload {
        score: RawScore::TenPoint(Some("8.5".to_string())),
        title: Some("The Departed".to_string()),
        year: Some("2006".to_string()),
        poster_url: Some("https://example.com/departed.jpg".to_string()),
    })
}

/// Letterboxd-shaped payload for "The Departed"
pub fn letterboxd_departed() -> RawSourceResult {
    RawSourceResult::Found(SourcePayload {
        score: RawScore::FivePoint(Some(4.31)),
        title: Some("The Departed".to_string()),
        year: Some("2006".to_string()),
        poster_url: None,
    })
}

// Request orchestrator: cache in front of the aggregation engine

use std::sync::Arc;

use super::aggregator::Aggregator;
use super::cache::{cache_key, TtlCache};
use crate::error::{AggregateError, Result};
use crate::models::AggregateResult;

pub struct LookupService {
    aggregator: Aggregator,
    cache: Arc<TtlCache>,
}

impl LookupService {
    pub fn new(aggregator: Aggregator, cache: Arc<TtlCache>) -> Self {
        Self { aggregator, cache }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Ratings for `title`, served from cache when fresh.
    ///
    /// Failures are returned as-is and never cached, so the next request for
    /// the same title aggregates from scratch. Two concurrent misses for one
    /// key both aggregate; the later put wins.
    pub async fn lookup(&self, title: &str) -> Result<AggregateResult> {
        let key = cache_key(title);
        if key.is_empty() {
            return Err(AggregateError::NotFound("Movie title is empty".to_string()));
        }

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for '{}'", key);
            return Ok(cached);
        }

        tracing::debug!("Cache miss for '{}', aggregating", key);
        let result = self.aggregator.aggregate(&key).await?;
        self.cache.put(&key, result.clone()).await;

        Ok(result)
    }
}

// Health check - probes every rating source

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{models::RatingSource, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub api_version: &'static str,
    pub dependencies: BTreeMap<&'static str, bool>,
}

fn dependency_name(source: RatingSource) -> &'static str {
    match source {
        RatingSource::Imdb => "imdb_api",
        RatingSource::Letterboxd => "letterboxd_scraping",
        RatingSource::RottenTomatoes => "rotten_tomatoes",
    }
}

/// GET /health - 503 when a mandatory source is unreachable
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let statuses = state.lookup.aggregator().check_dependencies().await;

    let healthy = statuses
        .iter()
        .filter(|s| s.source.is_mandatory())
        .all(|s| s.healthy);

    let dependencies: BTreeMap<&'static str, bool> = statuses
        .iter()
        .map(|s| (dependency_name(s.source), s.healthy))
        .collect();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        api_version: env!("CARGO_PKG_VERSION"),
        dependencies,
    };

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        tracing::warn!("Health check failed: {:?}", response.dependencies);
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

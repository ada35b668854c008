// Movies API - aggregated rating lookup

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{error::AggregateError, models::AggregateResult, AppState};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregateError::NotFound(_) => {
                tracing::info!("Lookup failed ({}): {}", self.kind(), self);
                StatusCode::NOT_FOUND
            }
            AggregateError::UpstreamConfig(_) | AggregateError::UpstreamUnavailable { .. } => {
                tracing::error!("Lookup failed ({}): {}", self.kind(), self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /movie/:title - Aggregated ratings for a movie title
pub async fn get_movie_scores(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Json<AggregateResult>, AggregateError> {
    tracing::info!("Received request for movie: {}", title);
    let result = state.lookup.lookup(&title).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get_json, state};
    use crate::models::RatingSource;
    use crate::services::sources::omdb::MISSING_API_KEY;
    use crate::services::sources::stub::{imdb_departed, letterboxd_departed, StubProvider};
    use crate::services::sources::RawSourceResult;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_successful_lookup() {
        let state = state(
            StubProvider::new(RatingSource::Imdb, imdb_departed()),
            StubProvider::new(RatingSource::Letterboxd, letterboxd_departed()),
            Some(StubProvider::new(
                RatingSource::RottenTomatoes,
                RawSourceResult::NotFound,
            )),
        );

        let (status, body) = get_json(state, "/movie/The%20Departed").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "The Departed");
        assert_eq!(body["imdb_score"], 85.0);
        assert!((body["letterboxd_score"].as_f64().unwrap() - 86.2).abs() < 1e-9);
        assert_eq!(body["aggregate_score"], 85.6);
        assert_eq!(body["year"], "2006");
        assert_eq!(body["poster"], "https://example.com/departed.jpg");
        assert!(body["rotten_tomatoes"]["critic_score"].is_null());
        assert!(body["rotten_tomatoes"]["audience_score"].is_null());
        assert!(body["rotten_tomatoes"]["aggregate_score"].is_null());
    }

    #[tokio::test]
    async fn test_not_found_is_404() {
        let state = state(
            StubProvider::new(RatingSource::Imdb, imdb_departed()),
            StubProvider::new(RatingSource::Letterboxd, RawSourceResult::NotFound),
            None,
        );

        let (status, body) = get_json(state, "/movie/zzznotamoviezzz").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["detail"],
            "Movie 'zzznotamoviezzz' not found on Letterboxd"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_500() {
        let state = state(
            StubProvider::new(
                RatingSource::Imdb,
                RawSourceResult::NotConfigured(MISSING_API_KEY.to_string()),
            ),
            StubProvider::new(RatingSource::Letterboxd, letterboxd_departed()),
            None,
        );

        let (status, body) = get_json(state, "/movie/the%20departed").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "OMDB API key not configured");
    }

    #[tokio::test]
    async fn test_unreachable_source_is_500() {
        let state = state(
            StubProvider::new(
                RatingSource::Imdb,
                RawSourceResult::Unavailable("connection reset".to_string()),
            ),
            StubProvider::new(RatingSource::Letterboxd, letterboxd_departed()),
            None,
        );

        let (status, body) = get_json(state, "/movie/heat").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "IMDb unavailable: connection reset");
    }

    #[tokio::test]
    async fn test_repeat_request_hits_cache() {
        let imdb = StubProvider::new(RatingSource::Imdb, imdb_departed());
        let letterboxd = StubProvider::new(RatingSource::Letterboxd, letterboxd_departed());
        let state = state(imdb.clone(), letterboxd.clone(), None);

        let (_, first) = get_json(state.clone(), "/movie/The%20Departed").await;
        let (_, second) = get_json(state, "/movie/THE%20DEPARTED").await;

        assert_eq!(first, second);
        assert_eq!(imdb.calls(), 1);
        assert_eq!(letterboxd.calls(), 1);
    }
}

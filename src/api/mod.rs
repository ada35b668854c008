use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

mod health;
mod movies;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health::health_check))
        .route("/movie/:title", get(movies::get_movie_scores))
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to the movie score aggregator!" }))
}

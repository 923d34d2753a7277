// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::rank::{self, RankError, RankQuery, TrendSummary};
use crate::store::TrendStore;

#[derive(Clone)]
pub struct AppState {
    store: Arc<TrendStore>,
}

impl AppState {
    pub fn new(store: Arc<TrendStore>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/trends", get(get_trends))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `GET /api/trends?limit=&window_hours=` — the externally consumable
/// ranking read. Bad parameters come back as 400, storage trouble as 500.
async fn get_trends(
    State(state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> Result<Json<Vec<TrendSummary>>, (StatusCode, String)> {
    match rank::top_trends(state.store.as_ref(), &query, Utc::now()) {
        Ok(rows) => Ok(Json(rows)),
        Err(RankError::Config(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(RankError::Storage(e)) => {
            tracing::error!(error = %e, "trend query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage error".to_string(),
            ))
        }
    }
}

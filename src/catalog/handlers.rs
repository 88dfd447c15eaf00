use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument, warn};

use super::dto::{ListQuery, SearchQuery, SearchResponse};
use super::repo_types::{CalorieCategory, Product};
use crate::{auth::services::AuthUser, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/brand/:brand", get(list_by_brand))
        .route("/products/category/:category", get(list_by_category))
}

#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let limit = q.limit.unwrap_or(state.config.search_limit);
    let seq = match state.searches.issue(user_id, q.seq) {
        Ok(seq) => seq,
        Err(seq) => {
            debug!(%user_id, seq, "search sequence already used or outdated");
            return Ok(Json(SearchResponse::stale(seq)));
        }
    };
    let out = state.catalog.search(&q.q, limit).await;

    if !state.searches.is_current(user_id, seq) {
        debug!(%user_id, seq, "search superseded; discarding results");
        return Ok(Json(SearchResponse::stale(seq)));
    }

    Ok(Json(SearchResponse {
        seq,
        stale: false,
        results: out.results,
        lowest_calorie: out.recommendation.lowest_calorie,
        balanced: out.recommendation.balanced,
    }))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Json<Vec<Product>> {
    let mut all = state.catalog.list_all().await;
    if let Some(limit) = q.limit {
        all.truncate(limit);
    }
    Json(all)
}

#[instrument(skip(state))]
pub async fn list_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Json<Vec<Product>> {
    Json(state.catalog.list_by_brand(&brand).await)
}

#[instrument(skip(state))]
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>, (StatusCode, String)> {
    let category: CalorieCategory = category.parse().map_err(|e: String| {
        warn!(error = %e, "bad category");
        (StatusCode::BAD_REQUEST, e)
    })?;
    Ok(Json(state.catalog.list_by_category(category).await))
}

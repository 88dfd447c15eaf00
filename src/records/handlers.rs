use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::assembler::Selection;
use super::calories::{estimate, DEFAULT_CUSTOM_CALORIES};
use super::dto::{EstimateRequest, EstimateResponse, RecordRequest, RecordResponse};
use super::repo_types::{Record, SugarTier};
use super::services::{Saved, SavedTo};
use super::session::EntrySession;
use crate::{auth::services::AuthUser, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records))
        .route("/records/:id", get(get_record))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/records", post(create_record))
        .route("/records/:id", put(update_record).delete(delete_record))
        .route("/records/estimate", post(estimate_calories))
}

#[instrument(skip(state))]
pub async fn list_records(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<Vec<Record>> {
    Json(state.records.list(user_id).await)
}

#[instrument(skip(state))]
pub async fn get_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Record>, (StatusCode, String)> {
    state
        .records
        .get(id, user_id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Record not found".into()))
}

#[instrument(skip(state, body))]
pub async fn create_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RecordRequest>,
) -> Result<(StatusCode, HeaderMap, Json<RecordResponse>), (StatusCode, String)> {
    let selection = resolve_selection(&state, &body, None).await?;

    let mut session = EntrySession::new();
    session.select(selection).map_err(bad_request)?;
    let draft = session.submit(&body.details()).map_err(bad_request)?;

    let outcome = state.records.save(user_id, &draft).await;
    session.finish(&outcome);
    let saved = outcome.map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    info!(%user_id, record_id = %saved.record.id, calories = saved.record.calories, "drink logged");

    let mut headers = HeaderMap::new();
    if let Ok(loc) = HeaderValue::from_str(&format!("/api/v1/records/{}", saved.record.id)) {
        headers.insert(axum::http::header::LOCATION, loc);
    }
    Ok((StatusCode::CREATED, headers, Json(response(saved))))
}

#[instrument(skip(state, body))]
pub async fn update_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RecordRequest>,
) -> Result<Json<RecordResponse>, (StatusCode, String)> {
    let Some(existing) = state.records.get(id, user_id).await else {
        warn!(%user_id, record_id = %id, "edit of unknown record");
        return Err((StatusCode::NOT_FOUND, "Record not found".into()));
    };

    let selection = resolve_selection(&state, &body, Some(&existing)).await?;

    let mut session = EntrySession::editing(existing);
    session.select(selection).map_err(bad_request)?;
    let draft = session.submit(&body.details()).map_err(bad_request)?;

    let outcome = state.records.update(id, user_id, &draft).await;
    session.finish(&outcome);
    let saved = outcome.map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    Ok(Json(response(saved)))
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .records
        .delete(id, user_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
}

#[instrument(skip(state, body))]
pub async fn estimate_calories(
    State(state): State<AppState>,
    Json(body): Json<EstimateRequest>,
) -> Json<EstimateResponse> {
    let product = match &body.product_id {
        Some(id) => state.catalog.find(id).await,
        None => None,
    };
    let sugar_level = SugarTier::from_percent(body.sugar_percent.min(100));
    Json(match product {
        Some(p) => EstimateResponse {
            calories: estimate(p.calories as f64, body.cup_size, body.sugar_percent as f64),
            sugar_level,
            custom: false,
        },
        None => EstimateResponse {
            calories: DEFAULT_CUSTOM_CALORIES,
            sugar_level,
            custom: true,
        },
    })
}

/// Product id first, then free text, then (when editing) whatever the record had.
async fn resolve_selection(
    state: &AppState,
    body: &RecordRequest,
    existing: Option<&Record>,
) -> Result<Selection, (StatusCode, String)> {
    if let Some(id) = &body.product_id {
        if let Some(p) = state.catalog.find(id).await {
            return Ok(Selection::Product(p));
        }
        if body.drink_name.is_none() {
            return Err((StatusCode::BAD_REQUEST, format!("Unknown product: {id}")));
        }
    }
    if let Some(name) = &body.drink_name {
        return Ok(Selection::Custom(name.clone()));
    }
    match existing {
        Some(r) => {
            if let Some(pid) = &r.product_id {
                if let Some(p) = state.catalog.find(pid).await {
                    return Ok(Selection::Product(p));
                }
            }
            Ok(Selection::Custom(r.drink_name.clone()))
        }
        None => Err((
            StatusCode::BAD_REQUEST,
            "productId or drinkName is required".into(),
        )),
    }
}

fn response(saved: Saved) -> RecordResponse {
    let message = match saved.saved_to {
        SavedTo::Remote => "Saved",
        SavedTo::Local => "Saved on this device",
    };
    RecordResponse {
        record: saved.record,
        saved_to: saved.saved_to,
        message: message.to_string(),
    }
}

fn bad_request<E: std::error::Error>(e: E) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

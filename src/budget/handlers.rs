use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{instrument, warn};

use super::dto::SetBudgetRequest;
use super::services::{weekly_summary, WeeklySummary};
use crate::{auth::services::AuthUser, state::AppState};

pub fn budget_routes() -> Router<AppState> {
    Router::new().route("/budget", get(get_budget).put(set_budget))
}

#[instrument(skip(state))]
pub async fn get_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<WeeklySummary> {
    let budget = state.budgets.get(user_id).await;
    let records = state.records.list(user_id).await;
    Json(weekly_summary(budget, &records, OffsetDateTime::now_utc()))
}

#[instrument(skip(state, body))]
pub async fn set_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SetBudgetRequest>,
) -> Result<Json<WeeklySummary>, (StatusCode, String)> {
    // stored as a Postgres INTEGER
    let weekly_budget = match i32::try_from(body.weekly_budget) {
        Ok(v) if v > 0 => v.unsigned_abs(),
        _ => {
            warn!(%user_id, value = body.weekly_budget, "rejected weekly budget");
            return Err((
                StatusCode::BAD_REQUEST,
                "weeklyBudget must be a positive number".into(),
            ));
        }
    };

    state
        .budgets
        .set(user_id, weekly_budget)
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let records = state.records.list(user_id).await;
    Ok(Json(weekly_summary(weekly_budget, &records, OffsetDateTime::now_utc())))
}

use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod matcher;
pub mod recommend;
pub mod repo;
pub mod repo_types;
pub mod seed;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::product_routes())
}

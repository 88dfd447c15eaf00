pub mod assembler;
pub mod calories;
mod dto;
pub mod handlers;
pub mod local;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}

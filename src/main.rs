mod app;
mod auth;
mod budget;
mod catalog;
mod config;
mod records;
mod state;
mod store;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "teadiary=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    // Unreachable database is not fatal; records and budgets fall back to local files.
    if app_state.config.remote_enabled {
        if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
            tracing::warn!(error = %e, "migrations failed; continuing with local fallback");
        }
    }

    app::serve(app::build_app(app_state)).await
}

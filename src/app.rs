use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, budget, catalog, records};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(auth::router())
                  .merge(catalog::router())
                  .merge(records::router())
                  .merge(budget::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::services::JwtKeys;

    struct TestApp {
        app: Router,
        token: String,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let state = AppState::fake(dir.path());
            let token = JwtKeys::from(&state.config.jwt)
                .sign_access(Uuid::new_v4())
                .unwrap();
            Self {
                app: build_app(state),
                token,
                _dir: dir,
            }
        }

        async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
            let body = match body {
                Some(v) => {
                    req = req.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            let res = self
                .app
                .clone()
                .oneshot(req.body(body).unwrap())
                .await
                .unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let t = TestApp::new();
        let res = t
            .app
            .clone()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn records_require_a_token() {
        let t = TestApp::new();
        let res = t
            .app
            .clone()
            .oneshot(Request::get("/api/v1/records").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn search_returns_results_and_recommendations() {
        let t = TestApp::new();
        let (status, body) = t.call("GET", "/api/v1/products/search?q=oolong", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stale"], false);
        let results = body["results"].as_array().unwrap();
        assert!(!results.is_empty());
        assert!(body["lowestCalorie"].is_object());

        let (_, empty) = t.call("GET", "/api/v1/products/search?q=%20", None).await;
        assert!(empty["results"].as_array().unwrap().is_empty());
        assert!(empty["lowestCalorie"].is_null());
    }

    #[tokio::test]
    async fn outdated_search_sequence_is_marked_stale() {
        let t = TestApp::new();
        let (_, fresh) = t.call("GET", "/api/v1/products/search?q=tea&seq=10", None).await;
        assert_eq!(fresh["stale"], false);
        let (_, late) = t.call("GET", "/api/v1/products/search?q=te&seq=9", None).await;
        assert_eq!(late["stale"], true);
        assert!(late["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reused_search_sequence_is_marked_stale() {
        let t = TestApp::new();
        let (_, first) = t.call("GET", "/api/v1/products/search?q=tea&seq=4", None).await;
        assert_eq!(first["stale"], false);
        let (_, again) = t.call("GET", "/api/v1/products/search?q=milk&seq=4", None).await;
        assert_eq!(again["stale"], true);
        assert!(again["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_category_is_rejected() {
        let t = TestApp::new();
        let (status, _) = t.call("GET", "/api/v1/products/category/enormous", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = t.call("GET", "/api/v1/products/category/low", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().all(|p| p["category"] == "low"));
    }

    #[tokio::test]
    async fn log_edit_and_delete_a_drink() {
        let t = TestApp::new();

        let (status, created) = t
            .call(
                "POST",
                "/api/v1/records",
                Some(json!({
                    "productId": "chagee-001",
                    "cupSize": "large",
                    "sugarPercent": 100,
                    "mood": "relaxed",
                    "notes": "afternoon break"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["savedTo"], "local");
        let record = &created["record"];
        assert_eq!(record["brand"], "CHAGEE");
        // 220 * 1.3 * 1.0
        assert_eq!(record["calories"], 286);
        assert_eq!(record["sugarLevel"], "full");
        let id = record["id"].as_str().unwrap().to_string();
        let date = record["date"].clone();

        let (status, edited) = t
            .call(
                "PUT",
                &format!("/api/v1/records/{id}"),
                Some(json!({ "drinkName": "Homemade milk tea", "sugarPercent": 30 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["record"]["id"], id.as_str());
        assert_eq!(edited["record"]["date"], date);
        assert_eq!(edited["record"]["brand"], "custom");
        assert_eq!(edited["record"]["calories"], 200);
        assert_eq!(edited["record"]["sugarLevel"], "light");

        let (_, listed) = t.call("GET", "/api/v1/records", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = t.call("DELETE", &format!("/api/v1/records/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = t.call("DELETE", &format!("/api/v1/records/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, listed) = t.call("GET", "/api/v1/records", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_needs_product_or_name() {
        let t = TestApp::new();
        let (status, _) = t.call("POST", "/api/v1/records", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = t
            .call("POST", "/api/v1/records", Some(json!({ "drinkName": "  " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = t
            .call("POST", "/api/v1/records", Some(json!({ "productId": "nope" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn editing_unknown_record_is_not_found() {
        let t = TestApp::new();
        let (status, _) = t
            .call(
                "PUT",
                &format!("/api/v1/records/{}", Uuid::new_v4()),
                Some(json!({ "drinkName": "x" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn estimate_preview() {
        let t = TestApp::new();
        let (_, body) = t
            .call(
                "POST",
                "/api/v1/records/estimate",
                Some(json!({ "productId": "mixue-001", "cupSize": "small", "sugarPercent": 0 })),
            )
            .await;
        // 160 * 0.8 * 0.7 = 89.6
        assert_eq!(body["calories"], 90);
        assert_eq!(body["sugarLevel"], "none");
        assert_eq!(body["custom"], false);

        let (_, custom) = t
            .call("POST", "/api/v1/records/estimate", Some(json!({ "cupSize": "large" })))
            .await;
        assert_eq!(custom["calories"], 200);
        assert_eq!(custom["custom"], true);
    }

    #[tokio::test]
    async fn budget_tracks_this_weeks_drinks() {
        let t = TestApp::new();
        let (_, summary) = t.call("GET", "/api/v1/budget", None).await;
        assert_eq!(summary["weeklyBudget"], 3500);
        assert_eq!(summary["consumed"], 0);
        assert_eq!(summary["status"], "under");

        let (status, _) = t
            .call("PUT", "/api/v1/budget", Some(json!({ "weeklyBudget": 0 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = t
            .call("PUT", "/api/v1/budget", Some(json!({ "weeklyBudget": 3_000_000_000i64 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = t
            .call("PUT", "/api/v1/budget", Some(json!({ "weeklyBudget": 240 })))
            .await;
        assert_eq!(status, StatusCode::OK);

        t.call("POST", "/api/v1/records", Some(json!({ "drinkName": "Street stall tea" })))
            .await;
        let (_, summary) = t.call("GET", "/api/v1/budget", None).await;
        assert_eq!(summary["weeklyBudget"], 240);
        assert_eq!(summary["consumed"], 200);
        assert_eq!(summary["status"], "near");
    }
}

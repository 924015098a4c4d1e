// [apps/orchestrator/src/routes.rs]
/*!
 * APARATO: CONTROL SURFACE ROUTER (ESTRATO L1-APP)
 * RESPONSABILIDAD: Las seis rutas de disparo manual bajo
 * `/api/v1/sync/*`, protegidas por `auth_guard`, más una ruta de
 * observabilidad sin autenticar y un `/health` de viveza.
 */

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::OrchestratorError;
use crate::middleware::auth_guard;
use crate::recompute;
use crate::repair;
use crate::orchestrator;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct CongressQuery {
    pub congress: Option<i32>,
}

pub fn build_router(state: AppState) -> Router {
    let sync_surface = Router::new()
        .route("/initial-historical-pull", post(initial_historical_pull))
        .route("/full", post(full_sync))
        .route("/incremental", post(incremental_sync))
        .route("/repair", post(repair_incomplete_bills))
        .route("/backfill", post(backfill_sync_status))
        .route("/recompute-stats", post(recompute_all_stats))
        .route("/completeness", get(completeness))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/sync", sync_surface)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn fault_response(error: OrchestratorError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": error.to_string() }))).into_response()
}

#[instrument(skip(state))]
async fn initial_historical_pull(State(state): State<AppState>) -> Response {
    match orchestrator::initial_historical_pull(&state).await {
        Ok(snapshot_ids) => {
            (StatusCode::ACCEPTED, Json(json!({ "snapshot_ids": snapshot_ids }))).into_response()
        }
        Err(error) => fault_response(error),
    }
}

#[instrument(skip(state))]
async fn full_sync(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    match orchestrator::full_sync(&state, query.congress).await {
        Ok(snapshot_id) => (StatusCode::ACCEPTED, Json(json!({ "snapshot_id": snapshot_id }))).into_response(),
        Err(error) => fault_response(error),
    }
}

#[instrument(skip(state))]
async fn incremental_sync(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    match orchestrator::incremental_sync(&state, query.congress).await {
        Ok(snapshot_id) => (StatusCode::ACCEPTED, Json(json!({ "snapshot_id": snapshot_id }))).into_response(),
        Err(error) => fault_response(error),
    }
}

#[instrument(skip(state))]
async fn repair_incomplete_bills(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    match repair::kick_off_repair(&state, query.congress).await {
        Ok(snapshot_id) => (StatusCode::ACCEPTED, Json(json!({ "snapshot_id": snapshot_id }))).into_response(),
        Err(error) => fault_response(error),
    }
}

#[instrument(skip(state))]
async fn backfill_sync_status(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    match repair::kick_off_backfill(&state, query.congress).await {
        Ok(snapshot_id) => (StatusCode::ACCEPTED, Json(json!({ "snapshot_id": snapshot_id }))).into_response(),
        Err(error) => fault_response(error),
    }
}

#[instrument(skip(state))]
async fn recompute_all_stats(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    match query.congress {
        Some(congress) => recompute::recompute_congress_stats(&state, congress).await,
        None => recompute::recompute_all_known_congresses(&state).await,
    }
    (StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))).into_response()
}

#[instrument(skip(state))]
async fn completeness(State(state): State<AppState>, Query(query): Query<CongressQuery>) -> Response {
    let Ok(bills) = state.bills() else {
        return fault_response(OrchestratorError::Configuration("could not open bill store".into()));
    };
    match bills.completeness(query.congress).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => fault_response(OrchestratorError::Store(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_infra_congress_client::CongressApiClient;
    use capitol_infra_db::DbClient;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state(sync_auth_token: Option<String>) -> AppState {
        let db = DbClient::connect("file::memory:?cache=shared", None).await.unwrap();
        let config = Arc::new(crate::config::Config {
            congress_api_key: "test-key".into(),
            sync_auth_token,
            database_url: "file::memory:?cache=shared".into(),
            database_auth_token: None,
            port: 0,
            batch_size: 50,
            inter_request_delay_ms: 1,
            max_retries: 1,
            initial_backoff_secs: 0,
            consecutive_fail_limit: 5,
            incremental_lookback_hours: 26,
            full_lookback_days: 7,
            incremental_stagger_ms: 1,
            full_stagger_ms: 1,
            dispatcher_concurrency: 1,
        });
        let client = Arc::new(CongressApiClient::new("test-key").unwrap());
        AppState::new(config, db, client)
    }

    #[tokio::test]
    async fn health_route_needs_no_auth() {
        let state = test_state(None).await;
        let app = build_router(state);

        let response = app
            .oneshot(axum::http::Request::get("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn sync_routes_reject_requests_without_a_bearer_token() {
        let state = test_state(Some("shared-secret".into())).await;
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::post("/api/v1/sync/incremental")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sync_routes_reject_everything_when_no_token_is_configured() {
        let state = test_state(None).await;
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::post("/api/v1/sync/incremental")
                    .header("Authorization", "Bearer anything")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn completeness_route_accepts_a_valid_bearer_token() {
        let state = test_state(Some("shared-secret".into())).await;
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/v1/sync/completeness")
                    .header("Authorization", "Bearer shared-secret")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

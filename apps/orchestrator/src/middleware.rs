// [apps/orchestrator/src/middleware.rs]
/*!
 * APARATO: AUTHENTICATION GUARD (ESTRATO L1-APP)
 * RESPONSABILIDAD: Protege las rutas de disparo manual con un único
 * secreto compartido (`SYNC_AUTH_TOKEN`). Sin ese secreto configurado,
 * el guardia rechaza toda petición en vez de abrir la puerta: un
 * control-surface sin token no está "abierto", está mal configurado.
 */

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

pub async fn auth_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.config.sync_auth_token.as_deref() else {
        warn!("rejecting manual-trigger request: SYNC_AUTH_TOKEN is not configured");
        return unauthorized("control surface has no auth token configured");
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(req).await,
        _ => unauthorized("missing or invalid bearer token"),
    }
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}

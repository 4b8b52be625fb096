//! HTTP endpoints.
//!
//! - `/metrics` : Prometheus text format
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 before the first tick and while draining)

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}};

use gaugebeat_core::exposition;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else if !state.is_ready() {
        (StatusCode::SERVICE_UNAVAILABLE, "warming up")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = exposition::encode(&state.registry().snapshot());

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

//! Time reference endpoint

use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Json};
use bounce_core::clock::TimeReference;

use crate::server::AppState;

/// Returns the server epoch and the current server time.
///
/// Responses must never be cached, otherwise viewers compute stale offsets.
pub async fn timer(State(state): State<AppState>) -> impl IntoResponse {
    let reference = TimeReference {
        epoch: state.epoch_ms,
        time: state.clock.now_ms(),
    };
    ([(CACHE_CONTROL, "no-cache")], Json(reference))
}

//! Static viewer assets: index page, script and logos

use std::io::ErrorKind;
use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::server::AppState;

pub async fn index_page(State(state): State<AppState>) -> Response {
    serve_static(&state, Path::new("index.html")).await
}

pub async fn simulation_script(State(state): State<AppState>) -> Response {
    serve_static(&state, Path::new("simulation.js")).await
}

/// Serves `logos/<n>.svg`; any other file name under `/logos` is a 404.
pub async fn logo(State(state): State<AppState>, UrlPath(file): UrlPath<String>) -> Response {
    if !is_logo_file_name(&file) {
        return not_found().await.into_response();
    }
    serve_static(&state, &Path::new("logos").join(file)).await
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain")],
        "Not found",
    )
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, "text/plain")],
        "Internal server error",
    )
        .into_response()
}

/// Logo names are a decimal index followed by `.svg`.
fn is_logo_file_name(name: &str) -> bool {
    name.strip_suffix(".svg")
        .is_some_and(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
}

async fn serve_static(state: &AppState, relative: &Path) -> Response {
    let path = state.static_dir.join(relative);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            let cache_control = format!("max-age={}", state.asset_max_age.as_secs());
            (
                [(CONTENT_TYPE, content_type), (CACHE_CONTROL, cache_control)],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == ErrorKind::NotFound => not_found().await.into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read static asset");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_file_names() {
        assert!(is_logo_file_name("0.svg"));
        assert!(is_logo_file_name("12.svg"));
        assert!(!is_logo_file_name(".svg"));
        assert!(!is_logo_file_name("a.svg"));
        assert!(!is_logo_file_name("1.png"));
        assert!(!is_logo_file_name("..%2F1.svg"));
        assert!(!is_logo_file_name("1xsvg"));
    }
}

//! Time reference server for Bounce viewers
//!
//! One process epoch is captured at startup and handed to every viewer, so
//! all of them count ticks from the same instant.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bounce_core::clock::{LocalClock, SystemClock};
use bounce_core::config::ServerConfig;
use tokio::net::TcpListener;

use crate::handlers::{index_page, logo, not_found, simulation_script, timer};

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Address {addr} is already in use")]
    AddressInUse { addr: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tick zero for every viewer, milliseconds since the Unix epoch.
    pub epoch_ms: i64,
    pub clock: Arc<dyn LocalClock>,
    pub static_dir: Arc<PathBuf>,
    pub asset_max_age: Duration,
}

impl AppState {
    /// State with the epoch set to the current system time.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// State driven by an arbitrary clock; the epoch is read from it once.
    pub fn with_clock(config: &ServerConfig, clock: Arc<dyn LocalClock>) -> Self {
        Self {
            epoch_ms: clock.now_ms(),
            clock,
            static_dir: Arc::new(config.static_dir.clone()),
            asset_max_age: config.asset_max_age,
        }
    }
}

/// Builds the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/index.html", get(index_page))
        .route("/simulation.js", get(simulation_script))
        .route("/logos/{file}", get(logo))
        .route("/timer", get(timer))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Binds the configured address and serves until the process exits.
///
/// # Errors
///
/// - `WebError::AddressInUse` - If another process holds the port
/// - `WebError::Bind` - If the address cannot be bound for another reason
/// - `WebError::Serve` - If the accept loop fails
pub async fn run_server(config: &ServerConfig) -> Result<(), WebError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            WebError::AddressInUse { addr: addr.clone() }
        } else {
            WebError::Bind {
                addr: addr.clone(),
                source: e,
            }
        }
    })?;

    serve(listener, AppState::new(config)).await
}

/// Serves on an already bound listener.
///
/// # Errors
///
/// - `WebError::Serve` - If the accept loop fails
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), WebError> {
    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        epoch = state.epoch_ms,
        static_dir = %state.static_dir.display(),
        "Time reference server listening"
    );

    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await?;
    Ok(())
}

/// Logs every request and rejects anything but GET.
async fn log_request(request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = client_ip(peer, request.headers());
    let method = request.method().clone();
    let path = logged_path(request.uri().path(), request.uri().query());

    tracing::info!(ip = %ip, method = %method, path = %path, "Request");

    if method != Method::GET {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(CONTENT_TYPE, "text/plain")],
            "Method not allowed",
        )
            .into_response();
    }

    next.run(request).await
}

/// Client address, trusting `X-Forwarded-For` only from a local proxy.
fn client_ip(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());

    match (peer, forwarded) {
        (Some(peer), Some(forwarded)) if peer.ip().is_loopback() => forwarded.to_string(),
        (Some(peer), _) => peer.ip().to_string(),
        (None, _) => "-".to_string(),
    }
}

/// Path as logged; index requests keep their `seed` parameter.
fn logged_path(path: &str, query: Option<&str>) -> String {
    if path != "/" && path != "/index.html" {
        return path.to_string();
    }

    let seed = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "seed")
            .map(|(_, value)| value.into_owned())
    });

    match seed {
        Some(seed) => format!("{path}?seed={seed}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use axum::body::{Body, to_bytes};
    use axum::http::header::CACHE_CONTROL;
    use axum::http::{HeaderValue, Request as HttpRequest};
    use bounce_core::clock::TimeReference;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    struct SteppingClock {
        now: AtomicI64,
    }

    impl LocalClock for SteppingClock {
        fn now_ms(&self) -> i64 {
            self.now.fetch_add(250, Ordering::SeqCst)
        }
    }

    fn test_state(static_dir: &std::path::Path) -> AppState {
        let config = ServerConfig {
            static_dir: static_dir.to_path_buf(),
            ..Default::default()
        };
        let clock = Arc::new(SteppingClock {
            now: AtomicI64::new(1_000),
        });
        AppState::with_clock(&config, clock)
    }

    fn static_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<canvas></canvas>").unwrap();
        std::fs::write(dir.path().join("simulation.js"), "// viewer").unwrap();
        std::fs::create_dir(dir.path().join("logos")).unwrap();
        std::fs::write(dir.path().join("logos/0.svg"), "<svg/>").unwrap();
        dir
    }

    async fn get_path(app: Router, uri: &str) -> Response {
        app.oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_timer_returns_epoch_and_current_time() {
        let dir = static_fixture();
        let app = build_router(test_state(dir.path()));

        let response = get_path(app, "/timer").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-cache"))
        );
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );

        let reference: TimeReference = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(reference.epoch, 1_000);
        assert_eq!(reference.time, 1_250);
    }

    #[tokio::test]
    async fn test_timer_sends_no_cross_origin_headers() {
        let dir = static_fixture();
        let app = build_router(test_state(dir.path()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/timer")
                    .header("origin", "http://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get("access-control-allow-origin")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_run_server_reports_address_in_use() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = held.local_addr().unwrap().port();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };

        let expected = format!("127.0.0.1:{port}");
        let result = run_server(&config).await;
        assert!(
            matches!(&result, Err(WebError::AddressInUse { addr }) if *addr == expected),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn test_static_assets_are_served_with_cache_headers() {
        let dir = static_fixture();
        let state = test_state(dir.path());

        for (uri, expected_type) in [("/", "text/html"), ("/index.html", "text/html")] {
            let response = get_path(build_router(state.clone()), uri).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[CONTENT_TYPE], expected_type);
            assert_eq!(response.headers()[CACHE_CONTROL], "max-age=3600");
            assert_eq!(body_text(response).await, "<canvas></canvas>");
        }

        let script = get_path(build_router(state.clone()), "/simulation.js").await;
        assert_eq!(script.status(), StatusCode::OK);
        let script_type = script.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(script_type.contains("javascript"));

        let logo = get_path(build_router(state), "/logos/0.svg").await;
        assert_eq!(logo.status(), StatusCode::OK);
        assert_eq!(logo.headers()[CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_missing_and_unknown_paths_are_not_found() {
        let dir = static_fixture();
        let state = test_state(dir.path());

        for uri in ["/logos/7.svg", "/logos/evil.svg", "/elsewhere", "/logos/0.png"] {
            let response = get_path(build_router(state.clone()), uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_text(response).await, "Not found");
        }
    }

    #[tokio::test]
    async fn test_missing_static_dir_still_serves_timer() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir.path().join("absent"));

        let index = get_path(build_router(state.clone()), "/").await;
        assert_eq!(index.status(), StatusCode::NOT_FOUND);

        let timer = get_path(build_router(state), "/timer").await;
        assert_eq!(timer.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreadable_asset_is_internal_error() {
        let dir = static_fixture();
        std::fs::create_dir(dir.path().join("logos/1.svg")).unwrap();

        let response = get_path(build_router(test_state(dir.path())), "/logos/1.svg").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_non_get_methods_rejected() {
        let dir = static_fixture();
        let app = build_router(test_state(dir.path()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/timer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "Method not allowed");
    }

    #[test]
    fn test_client_ip_trusts_forwarded_only_from_loopback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9 "));

        let local: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let remote: SocketAddr = "198.51.100.2:5000".parse().unwrap();

        assert_eq!(client_ip(Some(local), &headers), "203.0.113.9");
        assert_eq!(client_ip(Some(remote), &headers), "198.51.100.2");
        assert_eq!(client_ip(Some(local), &HeaderMap::new()), "127.0.0.1");
        assert_eq!(client_ip(None, &headers), "-");

        headers.insert("x-forwarded-for", HeaderValue::from_static("a, b"));
        assert_eq!(client_ip(Some(local), &headers), "127.0.0.1");
    }

    #[test]
    fn test_logged_path_keeps_seed_for_index_only() {
        assert_eq!(logged_path("/", Some("seed=abc&x=1")), "/?seed=abc");
        assert_eq!(logged_path("/index.html", Some("seed=a%20b")), "/index.html?seed=a b");
        assert_eq!(logged_path("/timer", Some("seed=abc")), "/timer");
        assert_eq!(logged_path("/", None), "/");
    }
}

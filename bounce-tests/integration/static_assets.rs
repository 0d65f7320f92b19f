//! Viewer assets and the timer endpoint served over a real socket

use bounce_core::TimeReference;
use bounce_core::config::ServerConfig;
use bounce_web::AppState;
use tempfile::TempDir;
use tokio::net::TcpListener;

struct RunningServer {
    base: String,
    epoch: i64,
    _static_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start() -> RunningServer {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<canvas id=\"screen\"></canvas>").unwrap();
    std::fs::write(dir.path().join("simulation.js"), "// viewer").unwrap();
    std::fs::create_dir(dir.path().join("logos")).unwrap();
    for index in 0..3 {
        std::fs::write(
            dir.path().join(format!("logos/{index}.svg")),
            format!("<svg id=\"{index}\"/>"),
        )
        .unwrap();
    }

    let config = ServerConfig {
        static_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let state = AppState::new(&config);
    let epoch = state.epoch_ms;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        bounce_web::serve(listener, state).await.unwrap();
    });

    RunningServer {
        base: format!("http://{addr}"),
        epoch,
        _static_dir: dir,
        handle,
    }
}

#[tokio::test]
async fn test_timer_epoch_is_stable_and_time_advances() {
    let server = start().await;
    let client = reqwest::Client::new();

    let first: TimeReference = client
        .get(format!("{}/timer", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let response = client
        .get(format!("{}/timer", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["cache-control"], "no-cache");
    let second: TimeReference = response.json().await.unwrap();

    assert_eq!(first.epoch, server.epoch);
    assert_eq!(second.epoch, server.epoch);
    assert!(first.time >= first.epoch);
    assert!(second.time > first.time);
}

#[tokio::test]
async fn test_viewer_page_and_logos_are_served() {
    let server = start().await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{}/?seed=lobby-7", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    assert_eq!(page.headers()["content-type"], "text/html");
    assert_eq!(page.headers()["cache-control"], "max-age=3600");
    assert!(page.text().await.unwrap().contains("screen"));

    let logo = client
        .get(format!("{}/logos/2.svg", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(logo.status(), 200);
    assert_eq!(logo.headers()["content-type"], "image/svg+xml");
    assert_eq!(logo.text().await.unwrap(), "<svg id=\"2\"/>");

    let missing = client
        .get(format!("{}/logos/3.svg", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_timer_payload_has_exactly_epoch_and_time() {
    let server = start().await;

    let body: serde_json::Value = reqwest::get(format!("{}/timer", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["epoch"].is_i64());
    assert!(object["time"].is_i64());
}

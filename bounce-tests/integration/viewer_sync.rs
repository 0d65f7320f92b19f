//! Viewers synchronising against a live time reference server

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bounce_core::clock::{ClockSync, ClockSyncError, HttpTimeSource, LocalClock, SystemClock};
use bounce_core::config::{BounceConfig, ClockConfig, ServerConfig};
use bounce_core::{ClockOffset, LogoSet, Screensaver};
use bounce_web::AppState;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    fn at(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl LocalClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

async fn start_server(state: AppState) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        bounce_web::serve(listener, state).await.unwrap();
    });
    (addr, handle)
}

fn clock_config(url: String) -> ClockConfig {
    ClockConfig {
        timer_url: url,
        ..BounceConfig::for_testing().clock
    }
}

#[tokio::test]
async fn test_viewers_with_skewed_clocks_draw_the_same_frame() {
    let server_clock = Arc::new(ManualClock::at(1_000_000));
    let state = AppState::with_clock(&ServerConfig::default(), server_clock);
    let (addr, server) = start_server(state).await;
    let config = clock_config(format!("http://{addr}/timer"));

    // One viewer runs 5s behind the server, the other 9s ahead.
    let behind = ManualClock::at(995_000);
    let ahead = ManualClock::at(1_009_000);
    let first = ClockSync::new(
        HttpTimeSource::new(&config).unwrap(),
        behind.clone(),
        config.clone(),
    );
    let second = ClockSync::new(
        HttpTimeSource::new(&config).unwrap(),
        ahead.clone(),
        config.clone(),
    );

    let first_offset = first.sync_once().await.unwrap();
    let second_offset = second.sync_once().await.unwrap();
    assert_eq!(first_offset.epoch, 1_000_000);
    assert_eq!(second_offset.epoch, 1_000_000);
    assert_eq!(first_offset.local_offset_ms, 5_000);
    assert_eq!(second_offset.local_offset_ms, -9_000);

    let display = BounceConfig::default().display;
    let logos = LogoSet::from_display(&display).unwrap();
    let viewer_a = Screensaver::new(&display, "lobby-7", logos).unwrap();
    let viewer_b = Screensaver::new(&display, "lobby-7", logos).unwrap();

    for elapsed_ms in [0, 16, 1_000, 60_000, 3_600_000] {
        behind.set(995_000 + elapsed_ms);
        ahead.set(1_009_000 + elapsed_ms);

        let a = viewer_a.frame_at(first.offset(), first.local_now_ms()).unwrap();
        let b = viewer_b.frame_at(second.offset(), second.local_now_ms()).unwrap();
        assert_eq!(a, b, "viewers disagree after {elapsed_ms}ms");
        assert_eq!(a.tick, elapsed_ms * 60 / 1_000);
    }

    server.abort();
}

#[tokio::test]
async fn test_system_clock_viewer_tracks_real_server() {
    let state = AppState::new(&ServerConfig::default());
    let epoch = state.epoch_ms;
    let (addr, server) = start_server(state).await;
    let config = clock_config(format!("http://{addr}/timer"));

    let sync = Arc::new(ClockSync::new(
        HttpTimeSource::new(&config).unwrap(),
        SystemClock,
        config,
    ));
    let task = Arc::clone(&sync).spawn();
    tokio::time::sleep(Duration::from_millis(200)).await;
    task.abort();

    let offset = sync.offset();
    assert_eq!(offset.epoch, epoch);
    // Same machine, so only request latency separates the clocks.
    assert!(offset.local_offset_ms.abs() < 1_000, "{offset:?}");
    assert!(sync.ticks_now(60.0).unwrap() >= 0);

    server.abort();
}

#[tokio::test]
async fn test_unreachable_server_keeps_default_offset() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = clock_config(format!("http://{addr}/timer"));
    let sync = ClockSync::new(HttpTimeSource::new(&config).unwrap(), SystemClock, config);

    assert!(matches!(sync.sync_once().await, Err(ClockSyncError::Request(_))));
    assert!(!sync.sync_or_keep().await);
    assert_eq!(sync.offset(), ClockOffset::default());
}

#[tokio::test]
async fn test_bad_responses_are_sync_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("simulation.js"), "// viewer").unwrap();
    let server_config = ServerConfig {
        static_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let (addr, server) = start_server(AppState::new(&server_config)).await;

    let missing = clock_config(format!("http://{addr}/no-such-timer"));
    let sync = ClockSync::new(HttpTimeSource::new(&missing).unwrap(), SystemClock, missing);
    assert!(matches!(
        sync.sync_once().await,
        Err(ClockSyncError::HttpStatus { status: 404, .. })
    ));

    let not_json = clock_config(format!("http://{addr}/simulation.js"));
    let sync = ClockSync::new(HttpTimeSource::new(&not_json).unwrap(), SystemClock, not_json);
    assert!(matches!(
        sync.sync_once().await,
        Err(ClockSyncError::MalformedPayload { .. })
    ));
    assert_eq!(sync.offset(), ClockOffset::default());

    server.abort();
}

//! Integration tests for resumable transfers against a mock file server.

mod support;

use std::path::Path;
use std::time::{Duration, Instant};

use gogdl_core::auth::Session;
use gogdl_core::http::HttpTimeouts;
use gogdl_core::manifest::{Asset, AssetKind};
use gogdl_core::transfer::{
    NoopObserver, ProgressObserver, ProgressTracker, TransferEngine, TransferError,
    TransferOutcome,
};
use support::socket_guard::{should_skip_socket_bound_test, start_mock_server_or_skip};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_PATH: &str = "/files/setup_foo_1.0.exe";

fn content() -> Vec<u8> {
    (0..2000u32).map(|i| (i % 251) as u8).collect()
}

fn session(server: &MockServer) -> Session {
    Session::from_cookies(&[], &server.uri(), HttpTimeouts::default()).unwrap()
}

fn asset(server: &MockServer) -> Asset {
    Asset {
        url: format!("{}{FILE_PATH}", server.uri()),
        name: "Foo Installer".to_string(),
        version: "1.0".to_string(),
        release_date: None,
        size: "2 KB".to_string(),
        kind: AssetKind::Primary,
    }
}

async fn mount_head(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn write_partial(dir: &Path, bytes: &[u8]) {
    std::fs::write(dir.join("setup_foo_1.0.incomplete"), bytes).unwrap();
}

#[derive(Default)]
struct Recorder {
    resumed_from: Option<u64>,
    started_at: Option<u64>,
    last_downloaded: u64,
    last_total: Option<u64>,
    finished: bool,
}

impl ProgressObserver for Recorder {
    fn on_resume(&mut self, offset: u64) {
        self.resumed_from = Some(offset);
    }

    fn on_start(&mut self, tracker: &ProgressTracker) {
        self.started_at = Some(tracker.downloaded());
    }

    fn on_progress(&mut self, tracker: &ProgressTracker) {
        assert!(tracker.downloaded() >= self.last_downloaded);
        self.last_downloaded = tracker.downloaded();
        self.last_total = tracker.total();
    }

    fn on_finish(&mut self, _tracker: &ProgressTracker) {
        self.finished = true;
    }
}

#[tokio::test]
async fn test_resume_appends_remaining_bytes_then_is_idempotent() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(header("range", "bytes=500-"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 500-1999/2000")
                .set_body_bytes(content[500..].to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &content[..500]);

    let session = session(&mock_server);
    let engine = TransferEngine::new(&session);
    let mut recorder = Recorder::default();
    let outcome = engine
        .transfer(&asset(&mock_server), dir.path(), &mut recorder)
        .await
        .unwrap();

    let final_path = dir.path().join("setup_foo_1.0.exe");
    assert_eq!(
        outcome,
        TransferOutcome::Completed {
            path: final_path.clone(),
            bytes: 2000,
            resumed: true,
        }
    );
    assert_eq!(std::fs::read(&final_path).unwrap(), content);
    assert!(!dir.path().join("setup_foo_1.0.incomplete").exists());
    assert_eq!(recorder.resumed_from, Some(500));
    assert_eq!(recorder.started_at, Some(500));
    assert_eq!(recorder.last_downloaded, 2000);
    assert_eq!(recorder.last_total, Some(2000));
    assert!(recorder.finished);

    let again = engine
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();
    assert_eq!(again, TransferOutcome::Skipped { path: final_path.clone() });
    assert_eq!(std::fs::read(&final_path).unwrap(), content);
}

#[tokio::test]
async fn test_fresh_transfer_sends_no_range() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = session(&mock_server);
    let outcome = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 2000, resumed: false, .. }
    ));
    assert_eq!(std::fs::read(outcome.path()).unwrap(), content);

    let requests = mock_server.received_requests().await.unwrap();
    let get = requests
        .iter()
        .find(|r| r.method.as_str() == "GET")
        .unwrap();
    assert!(!get.headers.contains_key("range"));
}

#[tokio::test]
async fn test_full_response_to_ranged_request_restarts_from_zero() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &[0xAA; 500]);

    let session = session(&mock_server);
    let outcome = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 2000, resumed: false, .. }
    ));
    assert_eq!(std::fs::read(outcome.path()).unwrap(), content);
}

#[tokio::test]
async fn test_unsatisfiable_range_with_complete_partial_finalizes() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(header("range", "bytes=2000-"))
        .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */2000"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &content);

    let session = session(&mock_server);
    let outcome = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 2000, resumed: true, .. }
    ));
    assert_eq!(std::fs::read(outcome.path()).unwrap(), content);
}

#[tokio::test]
async fn test_oversized_partial_is_discarded_and_restarted() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(header("range", "bytes=2500-"))
        .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */2000"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &[0x55; 2500]);

    let session = session(&mock_server);
    let outcome = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 2000, resumed: false, .. }
    ));
    assert_eq!(std::fs::read(outcome.path()).unwrap(), content);
}

#[tokio::test]
async fn test_range_answered_from_wrong_offset_restarts_from_zero() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(header("range", "bytes=500-"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 100-1999/2000")
                .set_body_bytes(content[100..].to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &[0xAA; 500]);

    let session = session(&mock_server);
    let outcome = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 2000, resumed: false, .. }
    ));
    assert_eq!(std::fs::read(outcome.path()).unwrap(), content);
    assert!(!dir.path().join("setup_foo_1.0.incomplete").exists());

    let requests = mock_server.received_requests().await.unwrap();
    let gets: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .collect();
    assert_eq!(gets.len(), 2);
    assert!(!gets[1].headers.contains_key("range"));
}

#[tokio::test]
async fn test_short_body_is_incomplete_and_keeps_partial() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = content();
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(header("range", "bytes=500-"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 500-1999/2000")
                .set_body_bytes(content[500..1200].to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &content[..500]);

    let session = session(&mock_server);
    let err = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap_err();

    let partial = dir.path().join("setup_foo_1.0.incomplete");
    match err {
        TransferError::Incomplete {
            path,
            expected,
            received,
        } => {
            assert_eq!(path, partial);
            assert_eq!(expected, 2000);
            assert_eq!(received, 1200);
        }
        other => panic!("expected Incomplete, got {other:?}"),
    }
    assert_eq!(std::fs::read(&partial).unwrap(), content[..1200].to_vec());
    assert!(!dir.path().join("setup_foo_1.0.exe").exists());
}

/// Serves `body` for any path, dribbling it out in `piece`-sized writes with
/// `gap` between them. HEAD gets the headers only.
async fn serve_slowly(listener: TcpListener, body: Vec<u8>, piece: usize, gap: Duration) {
    loop {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let body = body.clone();
        tokio::spawn(async move {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            if socket.write_all(head.as_bytes()).await.is_err() || request.starts_with(b"HEAD") {
                return;
            }
            for chunk in body.chunks(piece) {
                tokio::time::sleep(gap).await;
                if socket.write_all(chunk).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
        });
    }
}

#[tokio::test]
async fn test_steady_body_may_outlast_read_timeout() {
    if should_skip_socket_bound_test() {
        return;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let body: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    tokio::spawn(serve_slowly(
        listener,
        body.clone(),
        100,
        Duration::from_millis(300),
    ));

    let timeouts = HttpTimeouts {
        connect_secs: 5,
        read_secs: 1,
    };
    let session = Session::from_cookies(&[], &origin, timeouts).unwrap();
    let asset = Asset {
        url: format!("{origin}/files/setup.exe"),
        name: "Slow Installer".to_string(),
        version: "1.0".to_string(),
        release_date: None,
        size: "1 KB".to_string(),
        kind: AssetKind::Primary,
    };

    let dir = TempDir::new().unwrap();
    let started = Instant::now();
    let outcome = TransferEngine::new(&session)
        .transfer(&asset, dir.path(), &mut NoopObserver)
        .await
        .unwrap();

    assert!(started.elapsed() > Duration::from_secs(2));
    assert!(matches!(
        outcome,
        TransferOutcome::Completed { bytes: 1000, resumed: false, .. }
    ));
    assert_eq!(std::fs::read(dir.path().join("setup.exe")).unwrap(), body);
}

#[tokio::test]
async fn test_error_status_leaves_partial_untouched() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_head(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    write_partial(dir.path(), &[7; 500]);

    let session = session(&mock_server);
    let err = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap_err();

    assert!(
        matches!(err, TransferError::HttpStatus { status: 503, .. }),
        "got {err:?}"
    );
    assert_eq!(
        std::fs::read(dir.path().join("setup_foo_1.0.incomplete")).unwrap(),
        vec![7; 500]
    );
    assert!(!dir.path().join("setup_foo_1.0.exe").exists());
}

#[tokio::test]
async fn test_filename_probe_follows_redirect_and_decodes() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .and(path("/downloads/foo/en1installer0"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/secure/My%20Game%20(v2).exe"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/secure/My"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let session = session(&mock_server);
    let name = TransferEngine::new(&session)
        .resolve_filename(&format!("{}/downloads/foo/en1installer0", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(name, "My Game (v2).exe");
}

#[tokio::test]
async fn test_filename_probe_rejects_non_ok_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = session(&mock_server);
    let err = TransferEngine::new(&session)
        .transfer(&asset(&mock_server), dir.path(), &mut NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::HttpStatus { status: 404, .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

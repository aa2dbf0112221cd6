//! Shared test fixtures for integration tests.
#![allow(dead_code)] // Not every test file uses every fixture

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use trakr::canvas::{CanvasMetrics, Surface};
use trakr::config::TrelloConfig;
use trakr::models::{Card, Credentials, Label, Size};
use trakr::services::{FileStore, PendingRequest, Storage, TrelloError};

/// Cards with ids `c1..=cN` and no positions.
pub fn test_cards(count: usize) -> Vec<Card> {
    (1..=count)
        .map(|i| {
            Card::new(format!("c{i}"), format!("Card {i}"))
                .with_label(Label::new("l1", "Blog", Some("green")))
        })
        .collect()
}

/// Pixel metrics with jitter turned off so grid cells are exact.
pub fn pixel_metrics_without_jitter() -> CanvasMetrics {
    let mut metrics = CanvasMetrics::pixels();
    metrics.grid.jitter = 0.0;
    metrics
}

/// A measured 900x600 canvas inside a larger window.
pub fn canvas_900x600() -> Surface {
    Surface::measured(Size::new(900.0, 600.0), Size::new(1280.0, 800.0))
}

/// File-backed storage in a fresh temporary directory.
///
/// Keep the `TempDir` alive for as long as the storage is used.
pub fn temp_storage() -> (TempDir, Storage) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::with_backend(Arc::new(FileStore::new(dir.path()).unwrap()), true);
    (dir, storage)
}

/// Complete credentials for board `b`.
pub fn test_credentials() -> Credentials {
    Credentials::new("k", "t", "b")
}

/// Gateway settings pointing at `base_url`.
pub fn trello_config(base_url: &str) -> TrelloConfig {
    TrelloConfig {
        api_base_url: base_url.to_string(),
        timeout_secs: 5,
    }
}

/// One canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    status: u16,
    reason: &'static str,
    body: String,
    gate: Option<Arc<Barrier>>,
}

impl StubResponse {
    /// `200 OK` with a JSON body.
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body: body.to_string(),
            gate: None,
        }
    }

    /// Arbitrary status with a plain text body.
    pub fn status(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            body: body.to_string(),
            gate: None,
        }
    }

    /// Holds the response back until the test also waits on `gate`.
    pub fn held_until(mut self, gate: &Arc<Barrier>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }
}

/// Minimal HTTP server answering one connection per canned response.
///
/// Connections are matched to responses in accept order and answered on
/// their own threads, so a held response does not block later ones.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    answered: Arc<AtomicUsize>,
}

impl StubServer {
    /// Starts serving `responses` in order on a loopback port.
    pub fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let answered = Arc::new(AtomicUsize::new(0));

        let log = Arc::clone(&requests);
        let count = Arc::clone(&answered);
        thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let log = Arc::clone(&log);
                let count = Arc::clone(&count);
                thread::spawn(move || {
                    if let Some(request_line) = read_request_line(&mut stream) {
                        log.lock().unwrap().push(request_line);
                    }
                    if let Some(gate) = &response.gate {
                        gate.wait();
                    }
                    write_response(&mut stream, &response);
                    count.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            base_url,
            requests,
            answered,
        }
    }

    /// Number of responses fully written.
    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    /// Base URL to configure the client with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request lines received so far, e.g. `GET /1/boards/b/labels?... HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request_line(stream: &mut TcpStream) -> Option<String> {
    stream.set_read_timeout(Some(Duration::from_secs(2))).ok()?;

    let mut bytes = Vec::new();
    let mut buf = [0_u8; 1024];
    while !bytes.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(read) => bytes.extend_from_slice(&buf[..read]),
        }
    }

    String::from_utf8_lossy(&bytes)
        .lines()
        .next()
        .map(str::to_string)
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) {
    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.reason,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(payload.as_bytes());
    let _ = stream.flush();
}

/// A loopback URL nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Polls a request until it reports, failing the test after five seconds.
pub fn wait_for<T: Send + 'static>(request: &PendingRequest<T>) -> Result<T, TrelloError> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(result) = request.poll() {
            return result;
        }
        assert!(Instant::now() < deadline, "request did not finish in time");
        thread::sleep(Duration::from_millis(10));
    }
}

/// Repeats `step` until `done` holds, failing the test after five seconds.
pub fn wait_until<S>(state: &mut S, mut step: impl FnMut(&mut S), done: impl Fn(&S) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(state) {
        assert!(Instant::now() < deadline, "condition not reached in time");
        step(state);
        thread::sleep(Duration::from_millis(10));
    }
}

//! Shared test harness for integration tests.
//!
//! [`TestHarness`] writes a patterned media file to a temp dir and serves it
//! on a random port. [`RecordingSink`] is a [`MediaSink`] with a shared handle
//! so tests can flip its busy state and inspect what the driver appended.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::{self, Next};
use bytes::Bytes;

use rangecast::client::{FetchError, MediaSink};
use rangecast::server::{create_router, AppContext, MediaResource};

/// A live range server over a generated media file.
pub struct TestHarness {
    pub data: Vec<u8>,
    pub addr: SocketAddr,
    _dir: tempfile::TempDir,
}

impl TestHarness {
    /// Serve a `len`-byte patterned file on a random port.
    pub async fn with_media(len: usize) -> Self {
        Self::with_media_latency(len, Duration::ZERO).await
    }

    /// Like [`with_media`](Self::with_media), but every request is delayed by
    /// `latency` so tests can catch a fetch while it is still in flight.
    pub async fn with_media_latency(len: usize, latency: Duration) -> Self {
        // Modulus 251 is prime, so slices are distinguishable by position.
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("media.mp4");
        std::fs::write(&path, &data).expect("failed to write media file");

        let resource = MediaResource::open(&path, "video/mp4").expect("failed to open resource");
        let ctx = AppContext {
            resource: Arc::new(resource),
        };
        let mut app = create_router(ctx);
        if !latency.is_zero() {
            app = app.layer(middleware::from_fn(move |req: Request, next: Next| {
                async move {
                    tokio::time::sleep(latency).await;
                    next.run(req).await
                }
            }));
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            data,
            addr,
            _dir: dir,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

#[derive(Debug, Default)]
struct SinkLog {
    segments: Vec<Bytes>,
    busy: bool,
    aborts: usize,
    ended: bool,
    error: Option<String>,
}

/// A sink whose state is observable and controllable from the test.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<SinkLog>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, busy: bool) {
        self.inner.lock().unwrap().busy = busy;
    }

    pub fn segments(&self) -> Vec<Bytes> {
        self.inner.lock().unwrap().segments.clone()
    }

    /// Concatenation of every appended segment.
    pub fn appended(&self) -> Vec<u8> {
        let log = self.inner.lock().unwrap();
        log.segments.iter().flat_map(|s| s.iter().copied()).collect()
    }

    pub fn aborts(&self) -> usize {
        self.inner.lock().unwrap().aborts
    }

    pub fn ended(&self) -> bool {
        self.inner.lock().unwrap().ended
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().unwrap().error.clone()
    }
}

impl MediaSink for RecordingSink {
    fn is_busy(&self) -> bool {
        self.inner.lock().unwrap().busy
    }

    fn append(&mut self, segment: Bytes) {
        self.inner.lock().unwrap().segments.push(segment);
    }

    fn abort(&mut self) {
        self.inner.lock().unwrap().aborts += 1;
    }

    fn end_of_stream(&mut self, error: Option<&FetchError>) {
        let mut log = self.inner.lock().unwrap();
        log.ended = true;
        log.error = error.map(|e| e.to_string());
    }
}

//! End-to-end tests for the segment client against a live range server.

mod common;

use std::time::Duration;

use common::{RecordingSink, TestHarness};
use rangecast::client::{FetchError, PlayerEvent, RangeClient, SessionDriver};
use tokio::sync::mpsc;
use tokio::time::sleep;

const TIMEOUT: Duration = Duration::from_secs(5);

fn client_for(h: &TestHarness) -> RangeClient {
    RangeClient::new(h.url(), TIMEOUT).unwrap()
}

async fn wait_for_segments(sink: &RecordingSink, n: usize) {
    for _ in 0..200 {
        if sink.segments().len() >= n {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {} segments", n);
}

#[tokio::test]
async fn probe_reports_resource_length() {
    let h = TestHarness::with_media(12_000).await;

    let total = client_for(&h).probe().await.unwrap();
    assert_eq!(total, 12_000);
}

#[tokio::test]
async fn fetch_loop_reconstructs_resource() {
    let h = TestHarness::with_media(10_000).await;
    let sink = RecordingSink::new();

    let (events_tx, events_rx) = mpsc::channel(1);
    drop(events_tx); // no player; the idle sink self-paces

    let driver = SessionDriver::new(client_for(&h), sink.clone(), 1024, events_rx);
    driver.run().await.unwrap();

    // ceil(10000 / 1024) windows, concatenating to the exact resource.
    assert_eq!(sink.segments().len(), 10);
    assert_eq!(sink.appended(), h.data);
    assert!(sink.ended());
    assert_eq!(sink.error(), None);
    assert_eq!(sink.aborts(), 0);
}

#[tokio::test]
async fn single_window_resource_ends_after_init() {
    let h = TestHarness::with_media(300).await;
    let sink = RecordingSink::new();

    let (events_tx, events_rx) = mpsc::channel(1);
    drop(events_tx);

    // Chunk larger than the resource: the init window is clamped by the
    // server and already exhausts the stream.
    let driver = SessionDriver::new(client_for(&h), sink.clone(), 1000, events_rx);
    driver.run().await.unwrap();

    assert_eq!(sink.segments().len(), 1);
    assert_eq!(sink.appended(), h.data);
    assert!(sink.ended());
}

#[tokio::test]
async fn busy_sink_gates_fetches() {
    let h = TestHarness::with_media(8_192).await;
    let sink = RecordingSink::new();
    sink.set_busy(true);

    let (events_tx, events_rx) = mpsc::channel(8);
    let driver = SessionDriver::new(client_for(&h), sink.clone(), 1024, events_rx);
    let handle = tokio::spawn(driver.run());

    // The init segment lands regardless of busy state, nothing more.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.segments().len(), 1);

    // A drain notification while the sink is still busy is a no-op.
    events_tx.send(PlayerEvent::BufferDrained).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.segments().len(), 1);

    // Once idle, the next drain resumes the loop to completion.
    sink.set_busy(false);
    events_tx.send(PlayerEvent::BufferDrained).await.unwrap();

    handle.await.unwrap().unwrap();
    assert_eq!(sink.appended(), h.data);
    assert!(sink.ended());
}

#[tokio::test]
async fn seek_restarts_from_target_offset() {
    let h = TestHarness::with_media(20_000).await;
    let sink = RecordingSink::new();
    sink.set_busy(true);

    let (events_tx, events_rx) = mpsc::channel(8);
    let driver = SessionDriver::new(client_for(&h), sink.clone(), 1000, events_rx);
    let handle = tokio::spawn(driver.run());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.segments().len(), 1); // init only

    events_tx.send(PlayerEvent::Seek(15_000)).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.aborts(), 1);
    // Still busy: the seek itself must not have appended anything.
    assert_eq!(sink.segments().len(), 1);

    sink.set_busy(false);
    events_tx.send(PlayerEvent::BufferDrained).await.unwrap();

    handle.await.unwrap().unwrap();
    let segments = sink.segments();

    // Init window plus the five windows of the [15000, 20000) tail.
    assert_eq!(segments.len(), 6);
    assert_eq!(&segments[1][..], &h.data[15_000..16_000]);
    let tail: Vec<u8> = segments[1..]
        .iter()
        .flat_map(|s| s.iter().copied())
        .collect();
    assert_eq!(tail, h.data[15_000..]);
    assert!(sink.ended());
}

#[tokio::test]
async fn seek_discards_in_flight_fetch() {
    // Every request takes 300ms, so after the init segment lands the driver
    // is guaranteed to be sitting on an unresolved content fetch.
    let h = TestHarness::with_media_latency(50_000, Duration::from_millis(300)).await;
    let sink = RecordingSink::new();

    let (events_tx, events_rx) = mpsc::channel(8);
    let driver = SessionDriver::new(client_for(&h), sink.clone(), 5_000, events_rx);
    let handle = tokio::spawn(driver.run());

    // Init appended; the fetch for [5000, 9999] is now in flight. Seek away
    // from it before it can resolve.
    wait_for_segments(&sink, 1).await;
    events_tx.send(PlayerEvent::Seek(30_000)).await.unwrap();

    handle.await.unwrap().unwrap();
    let segments = sink.segments();

    assert_eq!(sink.aborts(), 1);
    // Nothing from the aborted pre-seek window: the init segment is followed
    // directly by the four windows of the [30000, 50000) tail.
    assert_eq!(segments.len(), 5);
    assert_eq!(&segments[1][..], &h.data[30_000..35_000]);
    let tail: Vec<u8> = segments[1..]
        .iter()
        .flat_map(|s| s.iter().copied())
        .collect();
    assert_eq!(tail, h.data[30_000..]);
    assert!(sink.ended());
}

#[tokio::test]
async fn fetch_error_surfaces_to_sink_and_caller() {
    let h = TestHarness::with_media(1_000).await;
    let sink = RecordingSink::new();

    let (events_tx, events_rx) = mpsc::channel(1);
    drop(events_tx);

    // Nothing served at this path, so the first fetch gets a 404.
    let client = RangeClient::new(format!("http://{}/missing", h.addr), TIMEOUT).unwrap();
    let driver = SessionDriver::new(client, sink.clone(), 1024, events_rx);
    let err = driver.run().await.unwrap_err();

    assert!(matches!(err, FetchError::Status(status) if status == 404));
    assert!(sink.ended());
    assert!(sink.error().unwrap().contains("404"));
    assert!(sink.segments().is_empty());
}

#[tokio::test]
async fn closed_events_with_busy_sink_stalls_without_eos() {
    let h = TestHarness::with_media(4_096).await;
    let sink = RecordingSink::new();
    sink.set_busy(true);

    let (events_tx, events_rx) = mpsc::channel(1);
    drop(events_tx);

    let driver = SessionDriver::new(client_for(&h), sink.clone(), 1024, events_rx);
    driver.run().await.unwrap();

    // No event source can ever report a drain: the driver stops after the
    // init segment without claiming the stream ended.
    assert_eq!(sink.segments().len(), 1);
    assert!(!sink.ended());
}

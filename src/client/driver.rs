//! Event-driven session driver.
//!
//! Runs one playback session: fetches the initialization segment, then paces
//! content fetches against the sink's busy state and the player's events. All
//! execution is cooperative on one task; at most one fetch is ever in flight,
//! and a seek drops it before any stale bytes can reach the sink.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc::Receiver;

use super::http::{FetchError, RangeClient, Segment};
use super::session::{SessionState, StreamSession};
use super::sink::MediaSink;

/// Player-side triggers, dispatched through a single event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The sink drained a previous append and can take the next one.
    BufferDrained,
    /// The user jumped to an absolute byte offset.
    Seek(u64),
}

type InflightFetch = Pin<Box<dyn Future<Output = Result<Segment, FetchError>> + Send>>;

/// Drives one session: owns the transport, the state machine, and the sink.
pub struct SessionDriver<S: MediaSink> {
    client: RangeClient,
    session: StreamSession,
    sink: S,
    events: Receiver<PlayerEvent>,
}

impl<S: MediaSink> SessionDriver<S> {
    pub fn new(client: RangeClient, sink: S, chunk_size: u64, events: Receiver<PlayerEvent>) -> Self {
        Self {
            client,
            session: StreamSession::new(chunk_size),
            sink,
            events,
        }
    }

    /// Run the session to completion, returning the sink.
    ///
    /// Resolves when end-of-stream has been signalled, or with the error of
    /// the fetch that cut the session short. A closed event channel is not an
    /// error: the session keeps self-pacing while the sink stays idle.
    pub async fn run(self) -> Result<S, FetchError> {
        let Self {
            client,
            mut session,
            mut sink,
            mut events,
        } = self;

        // The init segment is appended unconditionally and must land before
        // any content segment; its Content-Range total tells us where the
        // stream ends.
        let (start, end) = session.begin_init();
        let init = match client.fetch_range(start, end).await {
            Ok(segment) => segment,
            Err(err) => {
                sink.end_of_stream(Some(&err));
                session.fail();
                return Err(err);
            }
        };
        tracing::debug!(total_len = init.total_len, "initialization segment received");
        session.complete_init(init.total_len);
        sink.append(init.bytes);

        let mut inflight: Option<InflightFetch> = None;
        let mut events_open = true;

        pump(&client, &mut session, &mut sink, &mut inflight);

        loop {
            if session.state() == SessionState::Ended && inflight.is_none() {
                break;
            }

            if !events_open && inflight.is_none() {
                // No event source left; either make progress right now or
                // accept that nothing ever will.
                pump(&client, &mut session, &mut sink, &mut inflight);
                if inflight.is_none() {
                    if session.state() != SessionState::Ended {
                        tracing::warn!("Event channel closed while sink is busy; session stalled");
                    }
                    break;
                }
            }

            tokio::select! {
                event = events.recv(), if events_open => match event {
                    None => events_open = false,
                    Some(PlayerEvent::BufferDrained) => {
                        pump(&client, &mut session, &mut sink, &mut inflight);
                    }
                    Some(PlayerEvent::Seek(target)) => {
                        handle_seek(&client, &mut session, &mut sink, &mut inflight, target);
                    }
                },
                result = async { inflight.as_mut().expect("guarded by select condition").await },
                    if inflight.is_some() =>
                {
                    inflight = None;
                    match result {
                        Ok(segment) => {
                            tracing::trace!(start = segment.start, end = segment.end, "segment received");
                            sink.append(segment.bytes);
                            // The sink may already be drained; keep going
                            // without waiting for an explicit event.
                            pump(&client, &mut session, &mut sink, &mut inflight);
                        }
                        Err(err) => {
                            tracing::error!("Range fetch failed: {}", err);
                            sink.end_of_stream(Some(&err));
                            session.fail();
                            return Err(err);
                        }
                    }
                }
            }
        }

        Ok(sink)
    }
}

/// AppendNext: start the next fetch if both gates are open.
///
/// No-op while a fetch is in flight or the sink is busy; the cursor does not
/// advance in that case. Signals end-of-stream once the cursor passes the
/// total length.
fn pump<S: MediaSink>(
    client: &RangeClient,
    session: &mut StreamSession,
    sink: &mut S,
    inflight: &mut Option<InflightFetch>,
) {
    if inflight.is_some() || sink.is_busy() {
        return;
    }
    if session.state() != SessionState::Streaming {
        return;
    }

    match session.next_window() {
        Some((start, end)) => {
            tracing::debug!(start, end, "requesting segment");
            let client = client.clone();
            *inflight = Some(Box::pin(
                async move { client.fetch_range(start, end).await },
            ));
        }
        None => {
            tracing::debug!("resource exhausted, signalling end of stream");
            sink.end_of_stream(None);
            session.end();
        }
    }
}

/// Seek: drop any in-flight fetch, flush the sink's pending append, move the
/// cursor to the exact target byte, and resume immediately.
fn handle_seek<S: MediaSink>(
    client: &RangeClient,
    session: &mut StreamSession,
    sink: &mut S,
    inflight: &mut Option<InflightFetch>,
    target: u64,
) {
    if session.state() != SessionState::Streaming {
        tracing::debug!(seek_target = target, state = ?session.state(), "seek ignored");
        return;
    }

    if inflight.take().is_some() {
        tracing::debug!(seek_target = target, "seek aborted an in-flight fetch");
    }
    sink.abort();
    session.seek_to(target);

    tracing::debug!(seek_target = target, "seek, resuming stream");
    pump(client, session, sink, inflight);
}

//! Fetch cursor and session state machine.
//!
//! Pure state logic; the [driver](super::driver) owns the transport and the
//! sink and calls into this to decide which window to request next.

/// Where the next range request starts and how wide each window is.
///
/// Mutated only by the fetch loop and by seeks. The offset is advanced
/// *before* a fetch resolves so a concurrent trigger can never re-issue the
/// same window.
#[derive(Debug)]
pub struct FetchCursor {
    next_offset: u64,
    chunk_size: u64,
}

impl FetchCursor {
    pub fn new(chunk_size: u64) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            next_offset: 0,
            chunk_size,
        }
    }

    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Next inclusive window clamped to the resource, advancing the cursor.
    ///
    /// Returns `None` once `next_offset` has reached the total length; that
    /// offset check is the only end-of-stream condition.
    pub fn next_window(&mut self, total_len: u64) -> Option<(u64, u64)> {
        if self.next_offset >= total_len {
            return None;
        }
        let start = self.next_offset;
        let end = (start + self.chunk_size - 1).min(total_len - 1);
        self.next_offset += self.chunk_size;
        Some((start, end))
    }

    pub fn seek_to(&mut self, offset: u64) {
        self.next_offset = offset;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AwaitingInit,
    Streaming,
    Seeking,
    Ended,
}

/// One playback session's cursor, state, and learned resource length.
#[derive(Debug)]
pub struct StreamSession {
    cursor: FetchCursor,
    state: SessionState,
    total_len: Option<u64>,
}

impl StreamSession {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            cursor: FetchCursor::new(chunk_size),
            state: SessionState::Uninitialized,
            total_len: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// The initialization window `[0, chunk_size - 1]`; the decoder needs its
    /// contents before any later segment can be appended.
    pub fn begin_init(&mut self) -> (u64, u64) {
        debug_assert_eq!(self.state, SessionState::Uninitialized);
        self.state = SessionState::AwaitingInit;
        let end = self.cursor.chunk_size() - 1;
        self.cursor.seek_to(self.cursor.chunk_size());
        (0, end)
    }

    /// The init segment arrived, carrying the resource's total length.
    pub fn complete_init(&mut self, total_len: u64) {
        debug_assert_eq!(self.state, SessionState::AwaitingInit);
        self.total_len = Some(total_len);
        self.state = SessionState::Streaming;
    }

    /// Next window to request, or `None` when the resource is exhausted.
    pub fn next_window(&mut self) -> Option<(u64, u64)> {
        if self.state != SessionState::Streaming {
            return None;
        }
        let total_len = self.total_len?;
        self.cursor.next_window(total_len)
    }

    /// Jump the cursor to `target`. Returns false when the session cannot
    /// seek (not streaming yet, or the cursor is already retired).
    pub fn seek_to(&mut self, target: u64) -> bool {
        if self.state != SessionState::Streaming {
            return false;
        }
        self.state = SessionState::Seeking;
        self.cursor.seek_to(target);
        self.state = SessionState::Streaming;
        true
    }

    /// End-of-stream was signalled to the sink; the cursor is retired.
    pub fn end(&mut self) {
        self.state = SessionState::Ended;
    }

    /// A fetch failed; the session halts without further requests.
    pub fn fail(&mut self) {
        self.state = SessionState::Ended;
    }
}

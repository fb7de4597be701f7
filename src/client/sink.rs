//! The buffering sink seam.

use bytes::Bytes;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::http::FetchError;

/// The decoder-buffer consumer the fetch loop feeds.
///
/// Modeled on a media source buffer: appends are fire-and-forget, `is_busy`
/// is the sole admission gate for the next fetch, and end-of-stream may carry
/// the error that terminated the session.
pub trait MediaSink {
    /// True while the sink is still consuming a previous append.
    fn is_busy(&self) -> bool;

    /// Hand one fetched segment to the sink.
    fn append(&mut self, segment: Bytes);

    /// Discard any buffered-but-unconsumed append. Called on seek.
    fn abort(&mut self);

    /// No further segments will arrive; `error` is set when the stream was
    /// cut short by a failed fetch.
    fn end_of_stream(&mut self, error: Option<&FetchError>);
}

/// A [`MediaSink`] that writes segments to a local file.
///
/// Never busy, so a session with this sink self-paces. Write failures are
/// held until [`finish`](FileSink::finish); a failed sink reports busy so the
/// driver stops fetching data it could not store.
pub struct FileSink {
    file: File,
    written: u64,
    error: Option<std::io::Error>,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            file: File::create(path)?,
            written: 0,
            error: None,
        })
    }

    /// Flush and return the number of bytes written, or the first write error.
    pub fn finish(mut self) -> std::io::Result<u64> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.file.flush()?;
        Ok(self.written)
    }
}

impl MediaSink for FileSink {
    fn is_busy(&self) -> bool {
        self.error.is_some()
    }

    fn append(&mut self, segment: Bytes) {
        if self.error.is_some() {
            return;
        }
        match self.file.write_all(&segment) {
            Ok(()) => self.written += segment.len() as u64,
            Err(err) => {
                tracing::error!("Failed to write segment: {}", err);
                self.error = Some(err);
            }
        }
    }

    fn abort(&mut self) {
        // A file has no in-flight append to discard; seeking mid-download
        // would corrupt the output, so the CLI never issues one.
        tracing::warn!("Abort requested on a file sink");
    }

    fn end_of_stream(&mut self, error: Option<&FetchError>) {
        match error {
            Some(err) => tracing::error!("Stream ended with error: {}", err),
            None => tracing::debug!("Stream ended after {} bytes", self.written),
        }
    }
}

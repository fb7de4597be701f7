//! Segment client: paced retrieval of a media resource over range requests.
//!
//! The [`SessionDriver`] pulls successive byte windows from a [`RangeClient`]
//! and appends them to a [`MediaSink`], gated by the sink's busy state and
//! interrupted by [`PlayerEvent::Seek`].

mod driver;
mod http;
mod session;
mod sink;

pub use driver::{PlayerEvent, SessionDriver};
pub use http::{FetchError, RangeClient, Segment};
pub use sink::{FileSink, MediaSink};

//! Range-request transport over reqwest.

use bytes::Bytes;
use reqwest::{header, StatusCode};
use std::time::Duration;

/// Errors surfaced by the range transport.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection failure or request timeout.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status the protocol does not expect.
    #[error("Unexpected status: {0}")]
    Status(StatusCode),

    /// A partial response without a usable `Content-Range` header.
    #[error("Missing or malformed Content-Range header: {0:?}")]
    BadContentRange(Option<String>),

    /// Body length disagrees with the advertised interval.
    #[error("Body is {actual} bytes but Content-Range declared {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}

/// One fetched byte window together with the framing the server declared.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
    /// Total resource length from the `Content-Range` total field.
    pub total_len: u64,
    pub bytes: Bytes,
}

/// Thin HTTP client for one media resource URL.
#[derive(Debug, Clone)]
pub struct RangeClient {
    http: reqwest::Client,
    url: String,
}

impl RangeClient {
    /// Build a client whose individual range fetches are bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Length probe: a request without a `Range` header.
    ///
    /// The server advertises the total length via `Content-Range: bytes */N`
    /// without streaming a body; `Content-Length` is accepted as a fallback
    /// for servers that answer a plain 200.
    pub async fn probe(&self) -> Result<u64, FetchError> {
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        let content_range = header_string(&resp, header::CONTENT_RANGE);
        if let Some(total) = content_range.as_deref().and_then(parse_total) {
            return Ok(total);
        }

        resp.headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or(FetchError::BadContentRange(content_range))
    }

    /// Fetch the inclusive byte window `[start, end]`.
    ///
    /// The server may clamp `end`; the returned [`Segment`] carries the
    /// interval actually served and the resource's total length.
    pub async fn fetch_range(&self, start: u64, end: u64) -> Result<Segment, FetchError> {
        let resp = self
            .http
            .get(&self.url)
            .header(header::RANGE, format!("bytes={}-{}", start, end))
            .send()
            .await?;

        if resp.status() != StatusCode::PARTIAL_CONTENT {
            return Err(FetchError::Status(resp.status()));
        }

        let content_range = header_string(&resp, header::CONTENT_RANGE);
        let (served_start, served_end, total_len) = content_range
            .as_deref()
            .and_then(parse_content_range)
            .ok_or_else(|| FetchError::BadContentRange(content_range.clone()))?;

        let bytes = resp.bytes().await?;

        let expected = served_end - served_start + 1;
        if bytes.len() as u64 != expected {
            return Err(FetchError::LengthMismatch {
                expected,
                actual: bytes.len() as u64,
            });
        }

        Ok(Segment {
            start: served_start,
            end: served_end,
            total_len,
            bytes,
        })
    }
}

fn header_string(resp: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Parse `bytes <start>-<end>/<total>` from a partial response.
fn parse_content_range(value: &str) -> Option<(u64, u64, u64)> {
    let value = value.strip_prefix("bytes ")?;
    let (interval, total) = value.split_once('/')?;
    let total: u64 = total.trim().parse().ok()?;

    let (start, end) = interval.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end: u64 = end.trim().parse().ok()?;

    (start <= end && end < total).then_some((start, end, total))
}

/// Parse the total length from either `bytes */<total>` or
/// `bytes <start>-<end>/<total>`.
fn parse_total(value: &str) -> Option<u64> {
    let value = value.strip_prefix("bytes ")?;
    let (_, total) = value.split_once('/')?;
    total.trim().parse().ok()
}

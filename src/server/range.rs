//! HTTP `Range` header parsing.

/// A `Range` header that cannot be satisfied against the resource.
///
/// Covers both malformed headers and intervals with no intersection with
/// `[0, length)`; either way the answer is `416 Range Not Satisfiable`.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsatisfiableRange;

/// Parse an HTTP `Range` header against a resource of `resource_len` bytes.
///
/// Supports `bytes=<start>-[<end>]`; `start` is required, `end` defaults to
/// the last byte and is clamped to it. Returns the inclusive `(start, end)`
/// interval to serve.
pub fn parse_range(header: &str, resource_len: u64) -> Result<(u64, u64), UnsatisfiableRange> {
    let header = header.strip_prefix("bytes=").ok_or(UnsatisfiableRange)?;

    let (start, end) = header.split_once('-').ok_or(UnsatisfiableRange)?;
    let start = start.trim();
    let end = end.trim();

    let start: u64 = start.parse().map_err(|_| UnsatisfiableRange)?;
    if start >= resource_len {
        return Err(UnsatisfiableRange);
    }

    let end = if end.is_empty() {
        resource_len - 1
    } else {
        let end: u64 = end.parse().map_err(|_| UnsatisfiableRange)?;
        end.min(resource_len - 1)
    };

    if start > end {
        return Err(UnsatisfiableRange);
    }

    Ok((start, end))
}

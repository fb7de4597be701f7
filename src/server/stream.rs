//! Media resource and the probe/serve handler.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::range::parse_range;
use super::AppContext;

/// The single media file exposed by the server.
///
/// The length is statted once at startup and never changes during the server
/// lifetime; every served range is a subset of `[0, len)`.
#[derive(Debug, Clone)]
pub struct MediaResource {
    path: PathBuf,
    len: u64,
    content_type: String,
}

impl MediaResource {
    /// Open a media resource, recording its total length.
    pub fn open(path: &Path, content_type: &str) -> anyhow::Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| anyhow::anyhow!("Failed to stat media file {:?}: {}", path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            len: metadata.len(),
            content_type: content_type.to_string(),
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Serve the media resource with range request support.
///
/// Without a `Range` header this is a length probe: `200` with
/// `Content-Range: bytes */<len>` and no body. With one, the satisfiable
/// interval is streamed as `206 Partial Content`; an interval with no
/// intersection with the resource is answered with `416`.
pub async fn serve_media(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let resource = ctx.resource.as_ref();

    let range = match headers.get(header::RANGE) {
        None => {
            // Length probe: advertise the total size without streaming a body.
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, resource.content_type())
                .header(header::CONTENT_RANGE, format!("bytes */{}", resource.len()))
                .body(Body::empty())
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);
        }
        Some(value) => value.to_str().map_err(|_| StatusCode::BAD_REQUEST)?,
    };

    let (start, end) = match parse_range(range, resource.len()) {
        Ok(interval) => interval,
        Err(_) => {
            tracing::debug!(range, "unsatisfiable range request");
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", resource.len()))
                .body(Body::empty())
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let length = end - start + 1;

    // The handle lives in the response body stream and is released when the
    // body finishes or the connection aborts.
    let mut file = File::open(&resource.path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    file.seek(SeekFrom::Start(start))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let stream = ReaderStream::new(file.take(length));
    let body = Body::from_stream(stream);

    tracing::debug!(start, end, length, "serving partial content");

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, resource.content_type())
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, resource.len()),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

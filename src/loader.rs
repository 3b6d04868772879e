//! Loader — one-shot fetches for the payload document and the image header.
//!
//! DESIGN
//! ======
//! A source is either a local path or an `http(s)` URL. Both are read fully
//! into memory and handed to `payload::parse_payload`, which owns the parse
//! and schema stages. The loader only contributes `NetworkFailure`: any
//! transport error, missing file, or non-success HTTP status.
//!
//! The image probe streams the same kind of source in chunks and stops as soon
//! as the header yields the natural size. It never decodes pixels and never
//! reads past `PROBE_LIMIT_BYTES`, so multi-gigabyte slides cost one chunk.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use payload::{LoadError, NormalizedPayload};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};
use viewer::geometry::ImageDimensions;

use crate::config::{ConfigError, Timeouts};

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;

/// Upper bound on bytes read while looking for an image header.
pub const PROBE_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// Read size for local image sources.
const PROBE_CHUNK_BYTES: usize = 64 * 1024;

/// Enough leading bytes to recognize every supported signature.
const FORMAT_SNIFF_BYTES: usize = 32;

/// Failure to learn the primary image's natural size. Never fatal: the viewer
/// keeps its placeholder dimensions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("image fetch failed: {0}")]
    Fetch(String),

    #[error("image header unreadable: {0}")]
    Decode(String),
}

// =============================================================================
// SOURCE
// =============================================================================

/// Where a payload or image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(reqwest::Url),
}

impl Source {
    /// Classify a location string. Anything starting with `http://` or
    /// `https://` is a URL; everything else is a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns `NetworkFailure` if the string looks like a URL but does not parse.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = reqwest::Url::parse(raw).map_err(|e| LoadError::NetworkFailure(format!("invalid URL {raw}: {e}")))?;
            return Ok(Self::Url(url));
        }
        Ok(Self::Path(PathBuf::from(raw)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

// =============================================================================
// LOADER
// =============================================================================

/// Shared fetcher. Cheap to share behind an `Arc`; the HTTP client pools connections.
#[derive(Debug, Clone)]
pub struct Loader {
    http: reqwest::Client,
}

impl Loader {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeouts: Timeouts) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch and normalize the payload document.
    ///
    /// # Errors
    ///
    /// `NetworkFailure` if the bytes cannot be fetched, otherwise whatever
    /// `payload::parse_payload` reports.
    pub async fn load_payload(&self, source: &Source) -> Result<NormalizedPayload, LoadError> {
        let bytes = self.fetch(source).await.map_err(LoadError::NetworkFailure)?;
        debug!(%source, bytes = bytes.len(), "payload fetched");
        let payload = payload::parse_payload(&bytes)?;
        info!(
            %source,
            filename = %payload.filename,
            detections = payload.detections.len(),
            "payload ready"
        );
        Ok(payload)
    }

    /// Read the image's natural size from its header, fetching only as much
    /// of the source as the header needs.
    ///
    /// # Errors
    ///
    /// `Fetch` if the source cannot be opened or read, `Decode` if the format
    /// is unknown or no header is found within `PROBE_LIMIT_BYTES`.
    pub async fn probe_image(&self, source: &Source) -> Result<ImageDimensions, ProbeError> {
        let stream = self.open_header_stream(source).await.map_err(ProbeError::Fetch)?;
        let (dims, bytes_read) = probe_stream(stream, PROBE_LIMIT_BYTES).await?;
        debug!(%source, width = dims.width, height = dims.height, bytes_read, "image header probed");
        Ok(dims)
    }

    async fn open_header_stream(&self, source: &Source) -> Result<HeaderStream, String> {
        match source {
            Source::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                Ok(HeaderStream::Reader(Box::new(file)))
            }
            Source::Url(url) => {
                let response = self
                    .http
                    .get(url.clone())
                    .header(reqwest::header::RANGE, format!("bytes=0-{}", PROBE_LIMIT_BYTES - 1))
                    .send()
                    .await
                    .map_err(|e| format!("{url}: {e}"))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(format!("{url} returned {status}"));
                }
                Ok(HeaderStream::Http(response))
            }
        }
    }

    async fn fetch(&self, source: &Source) -> Result<Vec<u8>, String> {
        match source {
            Source::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| format!("{}: {e}", path.display())),
            Source::Url(url) => {
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| format!("{url}: {e}"))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(format!("{url} returned {status}"));
                }
                let body = response.bytes().await.map_err(|e| format!("{url}: {e}"))?;
                Ok(body.to_vec())
            }
        }
    }
}

// =============================================================================
// HEADER PROBE
// =============================================================================

/// Chunked view of an image source. Servers that ignore the range request
/// still only get read up to the header.
enum HeaderStream {
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    Http(reqwest::Response),
}

impl HeaderStream {
    /// Append the next chunk to `buf`. Returns `false` at end of input.
    async fn fill(&mut self, buf: &mut Vec<u8>) -> Result<bool, String> {
        match self {
            Self::Reader(reader) => {
                let mut chunk = vec![0; PROBE_CHUNK_BYTES];
                let read = reader.read(&mut chunk).await.map_err(|e| e.to_string())?;
                buf.extend_from_slice(&chunk[..read]);
                Ok(read > 0)
            }
            Self::Http(response) => match response.chunk().await.map_err(|e| e.to_string())? {
                Some(bytes) => {
                    buf.extend_from_slice(&bytes);
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

/// Grow a prefix of `stream` until the header parses. Returns the dimensions
/// and how many bytes were read.
async fn probe_stream(mut stream: HeaderStream, limit: usize) -> Result<(ImageDimensions, usize), ProbeError> {
    let mut buf = Vec::new();
    loop {
        let more = stream.fill(&mut buf).await.map_err(ProbeError::Fetch)?;
        if buf.len() >= FORMAT_SNIFF_BYTES {
            match image::guess_format(&buf) {
                Ok(format) if format.reading_enabled() => {}
                Ok(format) => return Err(ProbeError::Decode(format!("unsupported image format {format:?}"))),
                Err(_) => return Err(ProbeError::Decode("unrecognized image format".into())),
            }
        }
        match probe_dimensions(&buf) {
            Ok(dims) => return Ok((dims, buf.len())),
            Err(err) if !more => return Err(err),
            Err(_) if buf.len() >= limit => {
                return Err(ProbeError::Decode(format!("no image header in the first {limit} bytes")));
            }
            Err(_) => {}
        }
    }
}

/// Read image dimensions from encoded bytes without decoding pixels.
///
/// # Errors
///
/// Returns `Decode` if the format cannot be guessed or the header is invalid.
pub fn probe_dimensions(bytes: &[u8]) -> Result<ImageDimensions, ProbeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProbeError::Decode(e.to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ProbeError::Decode(e.to_string()))?;
    Ok(ImageDimensions::from((width, height)))
}

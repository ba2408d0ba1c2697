//! Dimension resolution: probes each post's image for its natural pixel size.
//!
//! Every probe resolves to a value: failures are logged and replaced with the
//! fallback square, so placement never sees a missing entry. Probes fan out with
//! no concurrency cap and the batch finishes when the slowest probe does.

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use image::ImageReader;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Post;
use crate::placement::geometry::ImageDimensions;

/// Side of the square substituted for any image that cannot be probed.
pub const FALLBACK_SIZE: f64 = 400.0;

/// Most bytes read from an image body. Format headers sit well inside this,
/// so the rest of the download is dropped unread.
pub const HEADER_READ_LIMIT: usize = 512 * 1024;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image request returned status {0}")]
    Status(u16),

    #[error("could not decode image header: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not read image header: {0}")]
    Io(#[from] std::io::Error),

    #[error("image reports zero width or height")]
    EmptyImage,

    #[error("probe task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Looks up the natural size of one image.
///
/// Carried in `AppState` as `Arc<dyn DimensionProbe>`.
#[async_trait]
pub trait DimensionProbe: Send + Sync {
    async fn probe(&self, image_url: &str) -> Result<ImageDimensions, ProbeError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HttpDimensionProbe
// ────────────────────────────────────────────────────────────────────────────

/// Downloads the image and reads its size from the header.
///
/// No retries: a failed download is the caller's fallback case.
#[derive(Clone)]
pub struct HttpDimensionProbe {
    client: Client,
}

impl HttpDimensionProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DimensionProbe for HttpDimensionProbe {
    async fn probe(&self, image_url: &str) -> Result<ImageDimensions, ProbeError> {
        let response = self.client.get(image_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body = read_header_bytes(response, HEADER_READ_LIMIT).await?;

        // Header parsing is cheap but synchronous; keep it off the async workers.
        tokio::task::spawn_blocking(move || decode_dimensions(body)).await?
    }
}

/// Collects at most `limit` bytes of the body, stopping the download there.
pub(crate) async fn read_header_bytes(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Bytes, ProbeError> {
    let mut buf = BytesMut::new();
    while buf.len() < limit {
        match response.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(limit);
    Ok(buf.freeze())
}

/// Reads width and height from an encoded image without decoding pixels.
pub(crate) fn decode_dimensions(body: Bytes) -> Result<ImageDimensions, ProbeError> {
    let (width, height) = ImageReader::new(Cursor::new(body))
        .with_guessed_format()?
        .into_dimensions()?;

    if width == 0 || height == 0 {
        return Err(ProbeError::EmptyImage);
    }

    Ok(ImageDimensions::new(f64::from(width), f64::from(height)))
}

// ────────────────────────────────────────────────────────────────────────────
// Batch resolution
// ────────────────────────────────────────────────────────────────────────────

/// Probes every post concurrently and returns one entry per post id.
///
/// Never fails. A probe error becomes a `FALLBACK_SIZE` square for that post only.
pub async fn resolve_dimensions(
    posts: &[Post],
    probe: &dyn DimensionProbe,
) -> HashMap<String, ImageDimensions> {
    let probes = posts.iter().map(|post| async move {
        let dims = match probe.probe(&post.image_url).await {
            Ok(dims) if dims.is_usable() => dims,
            Ok(dims) => {
                warn!(
                    post_id = %post.id,
                    width = dims.width,
                    height = dims.height,
                    "Probe returned unusable dimensions, using fallback"
                );
                ImageDimensions::square(FALLBACK_SIZE)
            }
            Err(e) => {
                warn!(post_id = %post.id, url = %post.image_url, "Image probe failed: {e}");
                ImageDimensions::square(FALLBACK_SIZE)
            }
        };
        (post.id.clone(), dims)
    });

    let resolved: HashMap<String, ImageDimensions> =
        futures::future::join_all(probes).await.into_iter().collect();

    debug!(posts = posts.len(), resolved = resolved.len(), "Dimension resolution finished");
    resolved
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

use async_trait::async_trait;
use thiserror::Error;

use crate::editor::preview::RenderedResume;

#[derive(Debug, Error)]
#[error("thumbnail capture failed: {0}")]
pub struct ThumbnailError(pub String);

/// Captures a small preview image of a rendered resume as a data URI.
///
/// Pluggable so embedders can bring their own rasterizer. The capture is a
/// side effect of an explicit save only, and a failure here never fails the
/// save that triggered it; the session logs and moves on.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    async fn capture(&self, resume: &RenderedResume) -> Result<String, ThumbnailError>;
}

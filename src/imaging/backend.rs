//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the image capability the dispatcher
//! delegates to: identify, read (stream unmodified), resize, and crop.
//! Every operation that produces bytes returns an [`EncodedImage`] so the
//! HTTP layer never needs to know how the pixels were made.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, built on
//! the `image` crate.

use super::params::{CropParams, ResizeParams};
use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Encoded image bytes ready to be written to a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EncodedImage {
    /// MIME type for the `Content-Type` header.
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Trait for image processing backends.
///
/// Implementations must be shareable across request handlers, hence
/// `Send + Sync`.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the file as-is, for requests without a transform.
    fn read(&self, path: &Path) -> Result<EncodedImage, BackendError>;

    /// Fit the image inside the requested box.
    fn resize(&self, params: &ResizeParams) -> Result<EncodedImage, BackendError>;

    /// Fill and center-crop the image to the requested size.
    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError>;
}

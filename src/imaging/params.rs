//! Parameter types for image transforms.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`dispatch`](crate::dispatch) module (which decides
//! whether a request needs a resize, a crop, or nothing at all) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing dispatch logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeParams`]: Fit-inside resize: source, target box, quality.
//! - [`CropParams`]: Fill + center crop: source, exact output size, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Quality from a request parameter: 0 means "not given" and falls back
    /// to `default`.
    pub fn or_default(requested: u32, default: Quality) -> Self {
        if requested == 0 {
            default
        } else {
            Self::new(requested)
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a resize that fits the image inside `width`×`height`.
///
/// A zero side is unconstrained and derived from the source aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a crop: resize to fill, then center-crop to exactly
/// `width`×`height`.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

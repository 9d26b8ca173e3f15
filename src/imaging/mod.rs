//! Image capability: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Read** | file bytes + format from extension |
//! | **Resize** | fit-inside math + Lanczos3 |
//! | **Crop** | fill resize + center crop |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
pub use calculations::{
    calculate_crop_dimensions, calculate_fill_dimensions, calculate_fit_dimensions,
};
pub use params::{CropParams, Quality, ResizeParams};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};

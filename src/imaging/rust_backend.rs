//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` after fit math |
//! | Crop | fill resize + `DynamicImage::crop_imm` from the center |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with the requested quality |
//! | Encode other formats | `DynamicImage::write_to` in the source format |

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::calculations::{
    calculate_crop_dimensions, calculate_fill_dimensions, calculate_fit_dimensions,
};
use super::params::{CropParams, Quality, ResizeParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const IMAGE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    IMAGE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension this backend can decode.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let e = e.to_ascii_lowercase();
            supported_input_extensions().contains(&e.as_str())
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn format_of(path: &Path) -> Result<ImageFormat, BackendError> {
    ImageFormat::from_path(path)
        .map_err(|_| BackendError::UnsupportedFormat(path.display().to_string()))
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` in `format`. Only JPEG takes the quality into account.
fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: Quality,
) -> Result<EncodedImage, BackendError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut bytes,
                quality.value() as u8,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut bytes), other)
                .map_err(|e| {
                    BackendError::ProcessingFailed(format!("{other:?} encode failed: {e}"))
                })?;
        }
    }
    Ok(EncodedImage { bytes, format })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read(&self, path: &Path) -> Result<EncodedImage, BackendError> {
        let format = format_of(path)?;
        let bytes = std::fs::read(path)?;
        Ok(EncodedImage { bytes, format })
    }

    fn resize(&self, params: &ResizeParams) -> Result<EncodedImage, BackendError> {
        let format = format_of(&params.source)?;
        let img = load_image(&params.source)?;
        let (w, h) =
            calculate_fit_dimensions((img.width(), img.height()), (params.width, params.height));
        let resized = img.resize_exact(w, h, FilterType::Lanczos3);
        encode_image(&resized, format, params.quality)
    }

    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError> {
        let format = format_of(&params.source)?;
        let img = load_image(&params.source)?;
        let source = (img.width(), img.height());

        let (crop_w, crop_h) = calculate_crop_dimensions(source, (params.width, params.height));
        let (fill_w, fill_h) = calculate_fill_dimensions(source, (crop_w, crop_h));

        // Fill-resize then center-crop to exact dimensions
        let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
        let x = fill_w.saturating_sub(crop_w) / 2;
        let y = fill_h.saturating_sub(crop_h) / 2;
        let cropped = filled.crop_imm(x, y, crop_w, crop_h);

        encode_image(&cropped, format, params.quality)
    }
}

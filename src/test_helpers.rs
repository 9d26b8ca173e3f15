//! Shared test utilities for the imgapi test suite.
//!
//! Builds a small content tree out of synthetic images so tests never depend
//! on fixture files checked into the repository.
//!
//! # Layout
//!
//! ```text
//! <tmp>/
//! ├── logo.png                      64x64
//! └── 010-blog/
//!     ├── header.png                320x80
//!     └── 003-post-1/
//!         ├── cover.jpg             800x600
//!         ├── .hidden.jpg           (never addressable)
//!         └── post.md
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a small valid JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid RGBA PNG with the given dimensions.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, 255])
    });
    img.save(path).unwrap();
}

// =========================================================================
// Content tree
// =========================================================================

/// Create the content tree described in the module docs.
pub fn setup_content() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let blog = tmp.path().join("010-blog");
    let post = blog.join("003-post-1");
    std::fs::create_dir_all(&post).unwrap();

    write_test_png(&tmp.path().join("logo.png"), 64, 64);
    write_test_png(&blog.join("header.png"), 320, 80);
    write_test_jpeg(&post.join("cover.jpg"), 800, 600);
    write_test_jpeg(&post.join(".hidden.jpg"), 10, 10);
    std::fs::write(post.join("post.md"), "# Post 1\n").unwrap();

    tmp
}

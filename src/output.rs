//! CLI output formatting.
//!
//! Listings are grouped by resource path, one header per content node, with
//! each image's transform URL as an indented context line:
//!
//! ```text
//! blog/post-1 (2 images)
//!     001 cover.jpg (800x600)
//!         URL: /imgapi/blog/post-1/cover.jpg
//!     002 detail.png (unreadable)
//!         URL: /imgapi/blog/post-1/detail.png
//! /
//!     001 logo.png (64x64)
//!         URL: /imgapi/logo.png
//!
//! 3 images in 2 resources
//! ```
//!
//! `format_*` functions return lines and do no I/O; `print_*` wrappers write
//! them to stdout.

use crate::address::{UrlContext, image_url};
use crate::attrs::TransformAttrs;
use crate::store::{ImageFile, split_uri};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Resource header: the resource path (`/` for the root) plus a count when
/// there is more than one image.
fn resource_header(resource_path: &str, count: usize) -> String {
    let name = if resource_path.is_empty() {
        "/"
    } else {
        resource_path
    };
    if count > 1 {
        format!("{name} ({})", plural(count, "image"))
    } else {
        name.to_string()
    }
}

/// Image line: index, filename and dimensions.
///
/// ```text
/// 001 cover.jpg (800x600)
/// 002 broken.jpg (unreadable)
/// ```
fn image_line(index: usize, filename: &str, width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        format!("{} {} (unreadable)", format_index(index), filename)
    } else {
        format!("{} {} ({}x{})", format_index(index), filename, width, height)
    }
}

/// Format a listing of `images` (expected sorted by URI).
pub fn format_listing(images: &[ImageFile], ctx: &UrlContext) -> Vec<String> {
    let mut lines = Vec::new();
    if images.is_empty() {
        lines.push("No images found".to_string());
        return lines;
    }

    let groups: Vec<&[ImageFile]> = images
        .chunk_by(|a, b| split_uri(&a.uri).0 == split_uri(&b.uri).0)
        .collect();

    for members in &groups {
        let (resource_path, _) = split_uri(&members[0].uri);
        lines.push(resource_header(resource_path, members.len()));
        for (i, image) in members.iter().enumerate() {
            let (_, filename) = split_uri(&image.uri);
            lines.push(format!(
                "{}{}",
                indent(1),
                image_line(i + 1, filename, image.width, image.height)
            ));
            lines.push(format!(
                "{}URL: {}",
                indent(2),
                image_url(image, TransformAttrs::None, ctx)
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        plural(images.len(), "image"),
        plural(groups.len(), "resource")
    ));
    lines
}

pub fn print_listing(images: &[ImageFile], ctx: &UrlContext) {
    for line in format_listing(images, ctx) {
        println!("{}", line);
    }
}

//! Resource resolution: from `resource path + filename` to an image on disk.
//!
//! The content root is a plain directory tree. Each directory is a content
//! node addressed by its slug (see [`naming`](crate::naming)); images inside
//! it are addressed by their filename:
//!
//! ```text
//! content/
//! ├── cover.jpg                       → cover.jpg
//! └── 010-blog/
//!     ├── header.png                  → blog/header.png
//!     └── 003-post-1/
//!         └── cover.jpg               → blog/post-1/cover.jpg
//! ```
//!
//! Lookups never leave the content root: `..`, `.`, empty segments and
//! hidden files do not resolve.

use crate::address::ImageAddressable;
use crate::imaging::{ImageBackend, is_supported_image};
use crate::naming::{matches_segment, uri_segment};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A resolved image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFile {
    /// Canonical URI: slugged resource path plus filename.
    pub uri: String,
    /// Location on disk.
    #[serde(skip)]
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageAddressable for ImageFile {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Looks up images by resource path and filename.
pub trait ResourceResolver: Send + Sync {
    /// `None` when either the resource or the file does not exist.
    fn resolve(&self, resource_path: &str, filename: &str) -> Option<ImageFile>;
}

/// Split `blog/post-1/cover.jpg` into `("blog/post-1", "cover.jpg")`.
///
/// A URI without `/` has an empty resource path.
pub fn split_uri(uri: &str) -> (&str, &str) {
    match uri.rsplit_once('/') {
        Some((resource_path, filename)) => (resource_path, filename),
        None => ("", uri),
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.starts_with('.')
        && !segment.contains('\\')
}

/// Filesystem-backed [`ResourceResolver`] rooted at a content directory.
pub struct ContentStore {
    root: PathBuf,
    backend: Arc<dyn ImageBackend>,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            root: root.into(),
            backend,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the child directory of `dir` addressed by `segment`.
    ///
    /// An exact directory name wins over a slug match; among slug matches
    /// the lowest-sorting name wins.
    fn find_child_dir(dir: &Path, segment: &str) -> Option<PathBuf> {
        let exact = dir.join(segment);
        if exact.is_dir() {
            return Some(exact);
        }
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| matches_segment(name, segment))
            })
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    /// Build the public URI for a directory relative to the root.
    ///
    /// Each directory is addressed by its slug only when the slug resolves
    /// back to that same directory; a sibling named exactly like the slug,
    /// or a lower-sorting directory with the same slug, keeps the full name.
    fn uri_for(&self, dir: &Path, filename: &str) -> String {
        let mut segments = Vec::new();
        if let Ok(rel) = dir.strip_prefix(&self.root) {
            let mut parent = self.root.clone();
            for name in rel.components().filter_map(|c| c.as_os_str().to_str()) {
                let current = parent.join(name);
                let slug = uri_segment(name);
                let slug_resolves_here = Self::find_child_dir(&parent, &slug)
                    .is_some_and(|found| found == current);
                segments.push(if slug_resolves_here {
                    slug
                } else {
                    name.to_string()
                });
                parent = current;
            }
        }
        segments.push(filename.to_string());
        segments.join("/")
    }

    fn image_file(&self, path: PathBuf, uri: String) -> ImageFile {
        let (width, height) = match self.backend.identify(&path) {
            Ok(dims) => (dims.width, dims.height),
            Err(e) => {
                warn!(uri = %uri, error = %e, "could not read image dimensions");
                (0, 0)
            }
        };
        ImageFile {
            uri,
            path,
            width,
            height,
        }
    }

    /// Every addressable image under the root, sorted by URI.
    pub fn list(&self) -> Vec<ImageFile> {
        let mut images: Vec<ImageFile> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| !name.starts_with('.'))
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
            .filter_map(|entry| {
                let path = entry.into_path();
                let filename = path.file_name()?.to_str()?.to_string();
                let dir = path.parent()?.to_path_buf();
                let uri = self.uri_for(&dir, &filename);
                Some(self.image_file(path, uri))
            })
            .collect();
        images.sort_by(|a, b| a.uri.cmp(&b.uri));
        images
    }

    /// Resolve a full URI such as `blog/post-1/cover.jpg`.
    pub fn find(&self, uri: &str) -> Option<ImageFile> {
        let (resource_path, filename) = split_uri(uri.trim_matches('/'));
        self.resolve(resource_path, filename)
    }
}

impl ResourceResolver for ContentStore {
    fn resolve(&self, resource_path: &str, filename: &str) -> Option<ImageFile> {
        if !is_safe_segment(filename) || !is_supported_image(Path::new(filename)) {
            debug!(filename, "rejected filename");
            return None;
        }

        let mut dir = self.root.clone();
        if !resource_path.is_empty() {
            for segment in resource_path.split('/') {
                if !is_safe_segment(segment) {
                    debug!(resource_path, "rejected resource path");
                    return None;
                }
                dir = Self::find_child_dir(&dir, segment)?;
            }
        }

        let path = dir.join(filename);
        if !path.is_file() {
            return None;
        }
        let uri = self.uri_for(&dir, filename);
        Some(self.image_file(path, uri))
    }
}

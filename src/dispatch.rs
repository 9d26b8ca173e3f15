//! Request routing and transform dispatch.
//!
//! Every inbound path goes through two states:
//!
//! ```text
//!   path ──strip prefix──▶ no match ──▶ fall through (not ours)
//!                      └─▶ match { resource_path, filename }
//!                              │
//!                              ├─ resolve ─▶ not found ─▶ DispatchError::NotFound
//!                              │
//!                              └─ plan(query) ─▶ Original │ Resize │ Crop ─▶ backend
//! ```
//!
//! Query parameters are tolerant: a non-numeric `width`, `height` or
//! `quality` counts as absent (0) and is reported back so the caller can log
//! it, but never fails the request.

use crate::config::EndpointConfig;
use crate::imaging::{
    BackendError, CropParams, EncodedImage, ImageBackend, Quality, ResizeParams,
};
use crate::store::{ResourceResolver, split_uri};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no image {filename:?} in resource {resource_path:?}")]
    NotFound {
        resource_path: String,
        filename: String,
    },
    #[error("image transform failed: {0}")]
    Backend(#[from] BackendError),
}

/// A path that starts with the endpoint prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Everything between the prefix and the last `/`.
    pub resource_path: &'a str,
    /// The last path segment.
    pub filename: &'a str,
}

/// Match `path` against `prefix` (normalized, e.g. `imgapi/`).
///
/// The leading `/` of `path` is optional. Returns `None` when the path is
/// not under the prefix.
pub fn match_route<'a>(prefix: &str, path: &'a str) -> Option<RouteMatch<'a>> {
    let rest = path.trim_start_matches('/').strip_prefix(prefix)?;
    let (resource_path, filename) = split_uri(rest);
    Some(RouteMatch {
        resource_path,
        filename,
    })
}

/// Transform parameters read from a query string.
///
/// Zero means "not given" for every numeric field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformQuery {
    pub width: u32,
    pub height: u32,
    pub crop: bool,
    pub quality: u32,
}

// Stricter than a plain "non-empty and not 0" flag: false, no and off also
// turn cropping off.
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

impl TransformQuery {
    /// Parse a raw query string.
    ///
    /// Returns the parsed query and the names of parameters whose values
    /// could not be read as numbers. Unknown parameters are ignored; when a
    /// parameter repeats, the last value wins.
    pub fn parse(raw: Option<&str>) -> (Self, Vec<String>) {
        let mut query = Self::default();
        let mut invalid = Vec::new();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            let slot = match key.as_ref() {
                "width" => &mut query.width,
                "height" => &mut query.height,
                "quality" => &mut query.quality,
                "crop" => {
                    query.crop = is_truthy(&value);
                    continue;
                }
                _ => continue,
            };
            let value = value.trim();
            *slot = if value.is_empty() {
                0
            } else {
                value.parse().unwrap_or_else(|_| {
                    invalid.push(key.to_string());
                    0
                })
            };
        }

        (query, invalid)
    }

    /// Decide what the backend should do.
    pub fn plan(&self, default_quality: Quality) -> TransformPlan {
        if self.width == 0 && self.height == 0 {
            return TransformPlan::Original;
        }
        let quality = Quality::or_default(self.quality, default_quality);
        if self.crop {
            TransformPlan::Crop {
                width: self.width,
                height: self.height,
                quality,
            }
        } else {
            TransformPlan::Resize {
                width: self.width,
                height: self.height,
                quality,
            }
        }
    }
}

/// What to do with a resolved image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPlan {
    /// Stream the file unmodified.
    Original,
    Resize {
        width: u32,
        height: u32,
        quality: Quality,
    },
    Crop {
        width: u32,
        height: u32,
        quality: Quality,
    },
}

/// Resolve the matched image and run the planned transform.
pub fn dispatch(
    resolver: &dyn ResourceResolver,
    backend: &dyn ImageBackend,
    route: RouteMatch<'_>,
    plan: TransformPlan,
) -> Result<EncodedImage, DispatchError> {
    let image = resolver
        .resolve(route.resource_path, route.filename)
        .ok_or_else(|| DispatchError::NotFound {
            resource_path: route.resource_path.to_string(),
            filename: route.filename.to_string(),
        })?;

    debug!(uri = %image.uri, ?plan, "dispatching");

    let encoded = match plan {
        TransformPlan::Original => backend.read(&image.path)?,
        TransformPlan::Resize {
            width,
            height,
            quality,
        } => backend.resize(&ResizeParams {
            source: image.path,
            width,
            height,
            quality,
        })?,
        TransformPlan::Crop {
            width,
            height,
            quality,
        } => backend.crop(&CropParams {
            source: image.path,
            width,
            height,
            quality,
        })?,
    };
    Ok(encoded)
}

/// Full request handling: match, parse, resolve, transform.
///
/// `None` means the path is not under the endpoint prefix and should fall
/// through to other routing.
pub fn handle_request(
    endpoint: &EndpointConfig,
    resolver: &dyn ResourceResolver,
    backend: &dyn ImageBackend,
    path: &str,
    raw_query: Option<&str>,
) -> Option<Result<EncodedImage, DispatchError>> {
    let route = match_route(&endpoint.prefix, path)?;

    let (query, invalid) = TransformQuery::parse(raw_query);
    if !invalid.is_empty() {
        warn!(path, params = ?invalid, "ignoring non-numeric transform parameters");
    }

    let result = dispatch(resolver, backend, route, query.plan(endpoint.default_quality));
    if let Err(e) = &result {
        warn!(path, error = %e, "image request failed");
    }
    Some(result)
}

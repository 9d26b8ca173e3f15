//! Structured transform results.
//!
//! A [`TransformDescriptor`] bundles the transform URL with the image's
//! dimensions and aspect ratio, for callers that lay out a placeholder
//! before the image loads (the classic `padding-bottom: {ratio}%` trick).
//!
//! The dimensions are those of the **original** image, not of the requested
//! transform output. A descriptor for `?width=200` on an 800×600 image still
//! reports `800`×`600`; only the ratio is meaningful for layout.

use crate::address::ImageAddressable;
use crate::attrs::Attributes;
use crate::url_builder::{OriginPolicy, build_url};
use serde::Serialize;
use tracing::warn;

/// URL plus original dimensions and aspect ratio of an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformDescriptor {
    pub src: String,
    pub width: u32,
    pub height: u32,
    /// `height / width * 100`.
    pub ratio: f64,
    /// Set when the width is zero and `ratio` could not be computed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degenerate: bool,
}

/// Aspect ratio as a percentage of the width.
///
/// Returns `None` for a zero width instead of `inf`/`NaN`.
pub fn aspect_ratio(width: u32, height: u32) -> Option<f64> {
    if width == 0 {
        return None;
    }
    Some(height as f64 / width as f64 * 100.0)
}

/// Build the descriptor for `image`.
pub fn build_descriptor<I: ImageAddressable + ?Sized>(
    image: &I,
    attrs: &Attributes,
    prefix: &str,
    origin: &OriginPolicy,
) -> TransformDescriptor {
    let src = build_url(origin, prefix, image.uri(), attrs);
    let (width, height) = (image.width(), image.height());

    let (ratio, degenerate) = match aspect_ratio(width, height) {
        Some(ratio) => (ratio, false),
        None => {
            warn!(uri = image.uri(), height, "image has zero width, reporting ratio 0");
            (0.0, true)
        }
    };

    TransformDescriptor {
        src,
        width,
        height,
        ratio,
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::resolve;

    struct Fixed {
        uri: &'static str,
        width: u32,
        height: u32,
    }

    impl ImageAddressable for Fixed {
        fn uri(&self) -> &str {
            self.uri
        }
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
    }

    const COVER: Fixed = Fixed {
        uri: "blog/post-1/cover.jpg",
        width: 800,
        height: 600,
    };

    #[test]
    fn ratio_is_height_over_width_percent() {
        assert_eq!(aspect_ratio(800, 600), Some(75.0));
        assert_eq!(aspect_ratio(400, 400), Some(100.0));
        assert_eq!(aspect_ratio(0, 600), None);
    }

    #[test]
    fn descriptor_reports_original_dimensions() {
        let d = build_descriptor(&COVER, &resolve(200u32), "imgapi/", &OriginPolicy::Relative);
        assert_eq!(d.src, "/imgapi/blog/post-1/cover.jpg?width=200");
        assert_eq!((d.width, d.height), (800, 600));
        assert_eq!(d.ratio, 75.0);
        assert!(!d.degenerate);
    }

    #[test]
    fn zero_width_is_flagged_not_nan() {
        let broken = Fixed {
            uri: "a/b.svg",
            width: 0,
            height: 10,
        };
        let d = build_descriptor(&broken, &Attributes::new(), "imgapi/", &OriginPolicy::Relative);
        assert_eq!(d.ratio, 0.0);
        assert!(d.degenerate);
    }

    #[test]
    fn serializes_without_flag_when_regular() {
        let d = build_descriptor(&COVER, &Attributes::new(), "imgapi/", &OriginPolicy::Relative);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "src": "/imgapi/blog/post-1/cover.jpg",
                "width": 800,
                "height": 600,
                "ratio": 75.0
            })
        );
    }
}

//! Link generation for anything that looks like an image.
//!
//! Template and application code never builds transform URLs by hand. It
//! hands an [`ImageAddressable`] and the desired attributes to
//! [`image_url`] or [`image_descriptor`], together with a [`UrlContext`]
//! built once from the endpoint configuration (and, when serving a request,
//! the request's origin).
//!
//! ```
//! use imgapi::address::{ImageAddressable, UrlContext, image_url};
//! use imgapi::config::EndpointConfig;
//!
//! struct Cover;
//! impl ImageAddressable for Cover {
//!     fn uri(&self) -> &str { "blog/post-1/cover.jpg" }
//!     fn width(&self) -> u32 { 800 }
//!     fn height(&self) -> u32 { 600 }
//! }
//!
//! let ctx = UrlContext::new(&EndpointConfig::default(), None);
//! assert_eq!(image_url(&Cover, 200u32, &ctx), "/imgapi/blog/post-1/cover.jpg?width=200");
//! ```

use crate::attrs::{TransformAttrs, resolve};
use crate::config::EndpointConfig;
use crate::descriptor::{TransformDescriptor, build_descriptor};
use crate::store::ResourceResolver;
use crate::url_builder::{OriginPolicy, RequestOrigin, build_url};

/// An image the endpoint can serve.
pub trait ImageAddressable {
    /// Resource path plus filename, e.g. `blog/post-1/cover.jpg`.
    fn uri(&self) -> &str;
    /// Intrinsic width in pixels.
    fn width(&self) -> u32;
    /// Intrinsic height in pixels.
    fn height(&self) -> u32;
}

/// Prefix and origin used for every link built in one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlContext {
    pub prefix: String,
    pub origin: OriginPolicy,
}

impl UrlContext {
    pub fn new(endpoint: &EndpointConfig, request: Option<&RequestOrigin>) -> Self {
        Self {
            prefix: endpoint.prefix.clone(),
            origin: OriginPolicy::resolve(&endpoint.site_url, endpoint.absolute, request),
        }
    }
}

/// Transform URL for `image`.
pub fn image_url<I: ImageAddressable + ?Sized>(
    image: &I,
    attrs: impl Into<TransformAttrs>,
    ctx: &UrlContext,
) -> String {
    build_url(&ctx.origin, &ctx.prefix, image.uri(), &resolve(attrs))
}

/// Transform URL plus original dimensions and ratio for `image`.
pub fn image_descriptor<I: ImageAddressable + ?Sized>(
    image: &I,
    attrs: impl Into<TransformAttrs>,
    ctx: &UrlContext,
) -> TransformDescriptor {
    build_descriptor(image, &resolve(attrs), &ctx.prefix, &ctx.origin)
}

/// Transform URL for `filename` inside the content node at `page`.
///
/// `None` when the page or the file does not exist.
pub fn page_image_url(
    resolver: &dyn ResourceResolver,
    page: &str,
    filename: &str,
    attrs: impl Into<TransformAttrs>,
    ctx: &UrlContext,
) -> Option<String> {
    let image = resolver.resolve(page, filename)?;
    Some(image_url(&image, attrs, ctx))
}

/// Descriptor for `filename` inside the content node at `page`.
pub fn page_image_descriptor(
    resolver: &dyn ResourceResolver,
    page: &str,
    filename: &str,
    attrs: impl Into<TransformAttrs>,
    ctx: &UrlContext,
) -> Option<TransformDescriptor> {
    let image = resolver.resolve(page, filename)?;
    Some(image_descriptor(&image, attrs, ctx))
}

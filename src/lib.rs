//! # imgapi
//!
//! An image transform endpoint for file-based content. Images live in a
//! content directory next to the pages that use them; templates ask for a
//! URL such as `/imgapi/blog/post-1/cover.jpg?width=400`, and the endpoint
//! resizes or crops the original on request.
//!
//! # Architecture: Two Directions
//!
//! The crate works in both directions over the same URL shape:
//!
//! ```text
//! outbound   ImageAddressable + attrs ──▶ "/imgapi/blog/post-1/cover.jpg?width=400"
//!            (address → attrs → url_builder, descriptor)
//!
//! inbound    GET /imgapi/blog/post-1/cover.jpg?width=400 ──▶ resized bytes
//!            (server → dispatch → store → imaging)
//! ```
//!
//! Link generation is pure string work and never touches disk. Request
//! handling resolves the file through a [`store::ResourceResolver`] and
//! transforms it through an [`imaging::ImageBackend`]; both are traits so
//! the dispatcher is tested with in-memory doubles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`attrs`] | Transform attributes: the width shorthand, explicit maps, query parsing |
//! | [`url_builder`] | URL composition: origin policy, prefix, form-encoded query |
//! | [`descriptor`] | URL plus original dimensions and aspect ratio |
//! | [`address`] | Public link API over anything implementing [`address::ImageAddressable`] |
//! | [`dispatch`] | Inbound route matching, query parsing, transform planning |
//! | [`store`] | Resource resolution against the content directory |
//! | [`naming`] | `NNN-slug` directory convention |
//! | [`imaging`] | Pure-Rust resize and crop behind the backend trait |
//! | [`server`] | `axum` routes for image bytes and JSON descriptors |
//! | [`config`] | `config.toml` loading, stock defaults, validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI listing format |
//!
//! # Design Decisions
//!
//! ## Misses Are 404s
//!
//! A request under the endpoint prefix for a file that does not resolve is a
//! 404, and no transform is attempted. A path outside the prefix is not
//! ours at all and gets the router's own 404.
//!
//! ## Tolerant Query Parameters
//!
//! `width=abc` is treated as if `width` were absent and logged, not
//! rejected. Links in published pages outlive the code that wrote them; a
//! malformed parameter should still show the picture.
//!
//! ## Original Dimensions in Descriptors
//!
//! A descriptor reports the source image's width, height and ratio, not the
//! size of the transformed output. The ratio is what layout code needs, and
//! it is the same for both whenever the transform preserves aspect.
//!
//! ## Same Format Out As In
//!
//! A resized PNG stays a PNG. Only JPEG output honours the quality setting;
//! other encoders use their defaults.

pub mod address;
pub mod attrs;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod server;
pub mod store;
pub mod url_builder;

#[cfg(test)]
pub(crate) mod test_helpers;

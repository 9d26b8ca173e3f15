//! End-to-end tests: the full router over a real content tree and the
//! `image`-crate backend.
//!
//! Each test builds its own temporary content directory with synthetic
//! images, sends one request through `tower::ServiceExt::oneshot`, and
//! decodes the response body to check the output dimensions.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use image::{GenericImageView, ImageEncoder, RgbImage, RgbaImage};
use imgapi::address::{UrlContext, image_url};
use imgapi::attrs::TransformAttrs;
use imgapi::config::EndpointConfig;
use imgapi::imaging::RustBackend;
use imgapi::server::{AppState, build_app};
use imgapi::store::ContentStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let file = std::fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, _| image::Rgba([(x % 256) as u8, 0, 0, 255]))
        .save(path)
        .unwrap();
}

/// ```text
/// <tmp>/
/// ├── logo.png                 64x64
/// └── 010-blog/
///     ├── header.png           320x80
///     └── 003-post-1/
///         └── cover.jpg        800x600
/// ```
fn content() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let post = tmp.path().join("010-blog/003-post-1");
    std::fs::create_dir_all(&post).unwrap();
    write_png(&tmp.path().join("logo.png"), 64, 64);
    write_png(&tmp.path().join("010-blog/header.png"), 320, 80);
    write_jpeg(&post.join("cover.jpg"), 800, 600);
    tmp
}

fn app(root: &Path) -> Router {
    build_app(AppState::for_content_root(EndpointConfig::default(), root))
}

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    content_length: Option<usize>,
    body: Vec<u8>,
}

async fn get(root: &Path, uri: &str) -> Reply {
    let response = app(root)
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::HOST, "example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let header_str = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header_str(header::CONTENT_TYPE);
    let content_length = header_str(header::CONTENT_LENGTH).and_then(|v| v.parse().ok());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    Reply {
        status,
        content_type,
        content_length,
        body,
    }
}

fn decoded_dimensions(body: &[u8]) -> (u32, u32) {
    image::load_from_memory(body).unwrap().dimensions()
}

// =========================================================================
// Transforms
// =========================================================================

#[tokio::test]
async fn width_only_fits_and_keeps_aspect() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg?width=200").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(reply.content_length, Some(reply.body.len()));
    assert_eq!(decoded_dimensions(&reply.body), (200, 150));
}

#[tokio::test]
async fn height_only_on_png_stays_png() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/header.png?height=40").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type.as_deref(), Some("image/png"));
    assert_eq!(decoded_dimensions(&reply.body), (160, 40));
}

#[tokio::test]
async fn crop_produces_exact_box() {
    let tmp = content();
    let reply = get(
        tmp.path(),
        "/imgapi/blog/post-1/cover.jpg?width=100&height=100&crop=1",
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(decoded_dimensions(&reply.body), (100, 100));
}

#[tokio::test]
async fn crop_with_one_side_is_square() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg?width=120&crop=true").await;
    assert_eq!(decoded_dimensions(&reply.body), (120, 120));
}

#[tokio::test]
async fn resize_never_upscales() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/logo.png?width=2000").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(decoded_dimensions(&reply.body), (64, 64));
}

#[tokio::test]
async fn lower_quality_gives_smaller_jpeg() {
    let tmp = content();
    let high = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg?width=400&quality=95").await;
    let low = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg?width=400&quality=10").await;
    assert!(low.body.len() < high.body.len());
}

// =========================================================================
// Originals
// =========================================================================

#[tokio::test]
async fn no_parameters_returns_file_bytes() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg").await;

    assert_eq!(reply.status, StatusCode::OK);
    let on_disk = std::fs::read(tmp.path().join("010-blog/003-post-1/cover.jpg")).unwrap();
    assert_eq!(reply.body, on_disk);
}

#[tokio::test]
async fn non_numeric_width_returns_original() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-1/cover.jpg?width=wide").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(decoded_dimensions(&reply.body), (800, 600));
}

// =========================================================================
// Misses
// =========================================================================

#[tokio::test]
async fn missing_file_is_404() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-1/missing.jpg?width=200").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_page_is_404() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/post-2/cover.jpg").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parent_segments_do_not_resolve() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapi/blog/../logo.png").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unrelated_path_is_404() {
    let tmp = content();
    let reply = get(tmp.path(), "/blog/post-1/cover.jpg").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

// =========================================================================
// Descriptors
// =========================================================================

#[tokio::test]
async fn descriptor_reports_original_dimensions() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapidata/blog/post-1/cover.jpg?width=200").await;

    assert_eq!(reply.status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(json["src"], "/imgapi/blog/post-1/cover.jpg?width=200");
    assert_eq!(json["width"], 800);
    assert_eq!(json["height"], 600);
    assert_eq!(json["ratio"], 75.0);
}

#[tokio::test]
async fn descriptor_accepts_numbered_directory_names() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapidata/010-blog/header.png").await;

    let json: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(json["src"], "/imgapi/blog/header.png");
    assert_eq!(json["ratio"], 25.0);
}

#[tokio::test]
async fn descriptor_for_missing_file_is_404() {
    let tmp = content();
    let reply = get(tmp.path(), "/imgapidata/blog/nope.png").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

// =========================================================================
// Built links
// =========================================================================

fn store(root: &Path) -> ContentStore {
    ContentStore::new(root, Arc::new(RustBackend::new()))
}

fn link_context() -> UrlContext {
    UrlContext::new(&EndpointConfig::default(), None)
}

#[tokio::test]
async fn links_to_awkward_filenames_are_served() {
    let tmp = content();
    for name in ["my photo.png", "50% off.png", "a#b?.png", "caf\u{e9}.png"] {
        write_png(&tmp.path().join("010-blog").join(name), 64, 64);
    }

    let store = store(tmp.path());
    for name in ["my photo.png", "50% off.png", "a#b?.png", "caf\u{e9}.png"] {
        let image = store.find(&format!("blog/{name}")).unwrap();
        let url = image_url(&image, 40u32, &link_context());
        assert!(!url.contains(' '), "{url} is not encoded");

        let reply = get(tmp.path(), &url).await;
        assert_eq!(reply.status, StatusCode::OK, "{url}");
        assert_eq!(decoded_dimensions(&reply.body), (40, 40), "{url}");
    }
}

#[tokio::test]
async fn every_listed_image_is_reachable_through_its_link() {
    let tmp = content();
    // `blog/` shadows the slug of `010-blog/`
    std::fs::create_dir(tmp.path().join("blog")).unwrap();
    write_png(&tmp.path().join("blog/other.png"), 16, 16);
    write_png(&tmp.path().join("010-blog/only-here.png"), 24, 24);

    let images = store(tmp.path()).list();
    assert!(images.iter().any(|i| i.uri == "010-blog/only-here.png"));
    assert!(images.iter().any(|i| i.uri == "blog/other.png"));

    for image in images {
        let url = image_url(&image, TransformAttrs::None, &link_context());
        let reply = get(tmp.path(), &url).await;
        assert_eq!(reply.status, StatusCode::OK, "{url}");
        assert_eq!(reply.body, std::fs::read(&image.path).unwrap(), "{url}");
    }
}

//! HTTP surface.
//!
//! Two routes, both derived from the endpoint configuration:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /{prefix}{resource_path}/{filename}?width&height&crop&quality` | transformed image bytes |
//! | `GET /{data_prefix}{resource_path}/{filename}?attrs` | [`TransformDescriptor`](crate::descriptor::TransformDescriptor) as JSON |
//!
//! Anything else falls through to a plain 404. Image work is blocking (disk
//! and codec), so it runs on the blocking pool.

use crate::address::{UrlContext, image_descriptor};
use crate::attrs::Attributes;
use crate::config::{EndpointConfig, SiteConfig};
use crate::dispatch::{DispatchError, handle_request};
use crate::imaging::{EncodedImage, ImageBackend, RustBackend};
use crate::store::{ContentStore, ResourceResolver, split_uri};
use crate::url_builder::RequestOrigin;
use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub endpoint: Arc<EndpointConfig>,
    pub resolver: Arc<dyn ResourceResolver>,
    pub backend: Arc<dyn ImageBackend>,
}

impl AppState {
    pub fn new(
        endpoint: EndpointConfig,
        resolver: Arc<dyn ResourceResolver>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            resolver,
            backend,
        }
    }

    /// State over a content directory with the `image`-crate backend.
    pub fn for_content_root(endpoint: EndpointConfig, root: impl Into<PathBuf>) -> Self {
        let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
        let store = ContentStore::new(root, Arc::clone(&backend));
        Self::new(endpoint, Arc::new(store), backend)
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

fn image_response(image: EncodedImage) -> Response {
    let content_type = HeaderValue::from_static(image.content_type());
    let content_length = HeaderValue::from(image.bytes.len());
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, content_length),
        ],
        image.bytes,
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

/// Scheme and host of the inbound request.
///
/// TLS is inferred from the usual proxy headers; the port-443 case is
/// handled by [`RequestOrigin::scheme`].
pub fn request_origin(headers: &HeaderMap) -> Option<RequestOrigin> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let header_is = |name: &str, expected: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    };
    let tls = header_is("x-forwarded-proto", "https") || header_is("x-forwarded-ssl", "on");
    Some(RequestOrigin::new(host, tls))
}

async fn serve_image(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let path = format!("{}{}", state.endpoint.prefix, rest.trim_start_matches('/'));

    let outcome = tokio::task::spawn_blocking(move || {
        handle_request(
            &state.endpoint,
            state.resolver.as_ref(),
            state.backend.as_ref(),
            &path,
            query.as_deref(),
        )
    })
    .await;

    match outcome {
        Ok(Some(Ok(image))) => image_response(image),
        Ok(Some(Err(e))) => e.into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            error!(error = %e, "image task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn serve_descriptor(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let ctx = UrlContext::new(&state.endpoint, request_origin(&headers).as_ref());
    let attrs = Attributes::from_query(query.as_deref().unwrap_or(""));

    let resolved = tokio::task::spawn_blocking(move || {
        let (resource_path, filename) = split_uri(rest.trim_start_matches('/'));
        state.resolver.resolve(resource_path, filename)
    })
    .await;

    match resolved {
        Ok(Some(image)) => Json(image_descriptor(&image, attrs, &ctx)).into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            error!(error = %e, "descriptor task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the router for `state`.
///
/// Prefixes come from a validated [`EndpointConfig`]; overlapping prefixes
/// would make the route table ambiguous.
pub fn build_app(state: AppState) -> Router {
    let image_route = format!("/{}{{*rest}}", state.endpoint.prefix);
    let data_route = format!("/{}{{*rest}}", state.endpoint.data_prefix);

    Router::new()
        .route(&image_route, get(serve_image))
        .route(&data_route, get(serve_descriptor))
        .fallback(|| async { not_found() })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

/// Serve `root` with `config` until Ctrl+C or SIGTERM.
pub async fn serve(config: &SiteConfig, root: PathBuf) -> Result<(), ServerError> {
    let endpoint = EndpointConfig::from_site_config(config);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    info!(
        addr = %addr,
        root = %root.display(),
        prefix = %endpoint.prefix,
        data_prefix = %endpoint.data_prefix,
        "starting image endpoint"
    );

    let app = build_app(AppState::for_content_root(endpoint, root));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

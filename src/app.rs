//! Router assembly.

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};

use crate::config::DOWNLOAD_ROUTE;
use crate::error::ApiError;
use crate::registry::Registry;
use crate::storage::Storage;
use crate::{files, frontend, http};

pub fn build_router(
    storage: Arc<Storage>,
    registry: Arc<dyn Registry>,
    upload_max_size: u64,
) -> Router {
    let body_limit = match usize::try_from(upload_max_size) {
        Ok(0) | Err(_) => DefaultBodyLimit::disable(),
        Ok(limit) => DefaultBodyLimit::max(limit),
    };

    Router::new()
        .route("/", get(frontend::index).fallback(http::method_not_allowed))
        .route(
            "/upload",
            post(files::upload_file)
                .fallback(http::method_not_allowed)
                .layer(body_limit),
        )
        .route(
            DOWNLOAD_ROUTE,
            get(files::download_file).fallback(http::method_not_allowed),
        )
        .route(
            "/delete",
            post(files::delete_file).fallback(http::method_not_allowed),
        )
        .route(
            "/style.css",
            get(frontend::stylesheet).fallback(http::method_not_allowed),
        )
        .fallback(|| async { ApiError::NotFound("not found".into()) })
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let client_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip().to_string())
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        "request",
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(Extension(storage))
        .layer(Extension(registry))
}

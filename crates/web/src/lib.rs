//! SkillSwap web application library.
//!
//! The application is exposed as a library so the integration tests can run
//! the exact router the binary serves.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod observer;
pub mod page;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header::CACHE_CONTROL},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Cache policy for `/static`; pages link assets with a content hash.
const STATIC_CACHE_CONTROL: &str = "public, max-age=86400";

/// Build the full application: routes, static files and the middleware stack.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let limiter = if config.auth_rate_limit {
        let limiter = auth_rate_limiter();
        if limiter.is_none() {
            tracing::warn!("Auth rate limiter could not be built; continuing without it");
        }
        limiter
    } else {
        None
    };

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&config.static_dir));

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(routes::routes(limiter))
        .nest_service("/static", static_files)
        .fallback(routes::not_found)
        .layer(create_session_layer(config))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

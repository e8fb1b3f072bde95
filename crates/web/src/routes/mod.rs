//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Catalog
//! GET  /health                   - Health check
//!
//! # Skills (requires session)
//! GET  /skill/{id}               - Skill detail with booking form
//! POST /skill/{id}/book          - Booking submit
//!
//! # Auth
//! GET  /login                    - Login page (?intent=<nonce>)
//! POST /login                    - Login action
//! GET  /signup                   - Signup page
//! POST /signup                   - Signup action
//! POST /logout                   - Logout action
//! GET  /forgot-password          - Password reset page (?email=)
//! POST /forgot-password          - Send reset email, then go to the mail portal
//!
//! # Google
//! GET  /auth/google              - Redirect to Google (?mode=login|signup&intent=)
//! GET  /auth/google/callback     - Handle OAuth callback
//!
//! # Account (requires session)
//! GET  /profile                  - Profile
//! GET  /update-profile           - Profile editor
//! POST /update-profile           - Save profile
//!
//! # Session
//! GET  /session/events           - Server-Sent Events: session transitions
//! ```
//!
//! POSTs to `/login`, `/signup` and `/forgot-password` are rate limited per
//! client IP when enabled in configuration.

pub mod account;
pub mod auth;
pub mod events;
pub mod federated;
pub mod home;
pub mod password;
pub mod skills;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use skillswap_core::navigation::paths;

use crate::filters;
use crate::identity::federated::CALLBACK_PATH;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::page::Page;
use crate::state::AppState;

/// Auth form submissions, optionally rate limited.
fn auth_form_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let router = Router::new()
        .route(paths::LOGIN, post(auth::login))
        .route(paths::SIGNUP, post(auth::signup))
        .route(paths::FORGOT_PASSWORD, post(password::forgot_password));

    match limiter {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// Create all routes.
pub fn routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route(paths::CATALOG, get(home::home))
        .route("/health", get(health))
        // Not nested: the session guard reads the full request path
        .route("/skill/{id}", get(skills::show))
        .route("/skill/{id}/book", post(skills::book))
        .route(paths::LOGIN, get(auth::login_page))
        .route(paths::SIGNUP, get(auth::signup_page))
        .route(paths::LOGOUT, post(auth::logout))
        .route(paths::FORGOT_PASSWORD, get(password::forgot_password_page))
        .merge(auth_form_routes(limiter))
        .route("/auth/google", get(federated::start))
        .route(CALLBACK_PATH, get(federated::callback))
        .route(paths::PROFILE, get(account::profile))
        .route(
            paths::UPDATE_PROFILE,
            get(account::update_profile_page).post(account::update_profile),
        )
        .route("/session/events", get(events::session_events))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call the identity provider.
async fn health() -> &'static str {
    "ok"
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub page: Page,
}

/// Fallback for unknown paths.
pub async fn not_found(page: Page) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate { page })
}

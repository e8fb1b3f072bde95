//! Session middleware configuration.
//!
//! Cookie sessions via tower-sessions with an in-memory store. The session
//! holds the client ID, the provider tokens, pending navigation intents and
//! queued toasts; nothing in it outlives the process.

use std::time::Duration;

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "skillswap_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How long a client's session observer may sit idle; matches the cookie expiry.
#[allow(clippy::cast_sign_loss)] // positive constant
pub const SESSION_IDLE: Duration = Duration::from_secs(SESSION_EXPIRY_SECONDS as u64);

/// Keys of values stored in the cookie session.
pub mod keys {
    /// Per-browser [`ClientId`](crate::observer::ClientId).
    pub const CLIENT_ID: &str = "client_id";

    /// Identity provider tokens.
    pub const PROVIDER_TOKENS: &str = "provider_tokens";

    /// Pending navigation intent and its nonce.
    pub const PENDING_INTENT: &str = "pending_intent";

    /// Queued toasts.
    pub const TOASTS: &str = "toasts";

    /// Google OAuth state (CSRF protection).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";

    /// Google OAuth nonce (`OpenID` Connect replay protection).
    pub const GOOGLE_OAUTH_NONCE: &str = "google_oauth_nonce";

    /// Which page started the Google flow, and the intent nonce it carried.
    pub const GOOGLE_OAUTH_ORIGIN: &str = "google_oauth_origin";
}

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &WebConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

//! Per-request layout context: who is signed in and which toasts to show.

use axum::{extract::FromRequestParts, http::request::Parts};

use skillswap_core::Identity;

use crate::error::AppError;
use crate::middleware::auth::AuthClient;
use crate::middleware::flash::{Toast, take_toasts};
use crate::state::AppState;

/// Data every template's layout needs.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Signed-in user, for the navbar.
    pub identity: Option<Identity>,
    /// Toasts to show once.
    pub toasts: Vec<Toast>,
}

impl Page {
    /// Resolve the session and drain queued toasts.
    ///
    /// Only call this when a page is actually rendered; redirecting handlers
    /// would otherwise swallow the toasts meant for the next page.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie session cannot be read.
    pub async fn load(auth: &AuthClient) -> Result<Self, AppError> {
        let session = auth.resolve().await?;
        Ok(Self {
            identity: session.identity().cloned(),
            toasts: take_toasts(auth.session()).await,
        })
    }

    /// Add a toast for this render.
    #[must_use]
    pub fn with_toast(mut self, toast: Toast) -> Self {
        self.toasts.push(toast);
        self
    }
}

impl FromRequestParts<AppState> for Page {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthClient::from_request_parts(parts, state).await?;
        Self::load(&auth).await
    }
}

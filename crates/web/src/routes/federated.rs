//! "Continue with Google" handlers.
//!
//! # Flow
//!
//! 1. `/auth/google` stores a CSRF state, an `OpenID` nonce and where the flow
//!    started, then redirects to Google
//! 2. Google redirects back to `/auth/google/callback` with a code
//! 3. The code is exchanged for an id token whose nonce is checked
//! 4. The id token is handed to the identity provider, which signs the user in
//!    (creating the account on first use)

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skillswap_core::navigation::{paths, post_login_destination};

use crate::error::AppError;
use crate::identity::federated::{FederatedError, GoogleOAuthClient};
use crate::identity::random_token;
use crate::middleware::auth::{AuthClient, AuthError};
use crate::middleware::flash::{Toast, push_toast};
use crate::middleware::session::keys;
use crate::state::AppState;

const STATE_LENGTH: usize = 32;

/// Which page started the flow; decides toasts and where failures land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    #[default]
    Login,
    Signup,
}

impl FlowMode {
    const fn success_message(self) -> &'static str {
        match self {
            Self::Login => "Logged in with Google",
            Self::Signup => "Signed up with Google",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Login => "Google login failed",
            Self::Signup => "Google signup failed",
        }
    }

    const fn failure_redirect(self) -> &'static str {
        match self {
            Self::Login => paths::LOGIN,
            Self::Signup => paths::SIGNUP,
        }
    }
}

/// Kept in the session between start and callback.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FlowOrigin {
    mode: FlowMode,
    intent: Option<String>,
}

/// Query parameters of the entry point.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    #[serde(default)]
    pub mode: FlowMode,
    pub intent: Option<String>,
}

/// Query parameters Google sends back.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
enum FlowError {
    #[error("Google sign-in is not configured")]
    NotConfigured,
    #[error("Google returned an error: {0}")]
    Denied(String),
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("callback without authorization code")]
    MissingCode,
    #[error(transparent)]
    Federated(#[from] FederatedError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Start the Google flow.
pub async fn start(
    State(state): State<AppState>,
    auth: AuthClient,
    Query(query): Query<StartQuery>,
) -> Result<Response, AppError> {
    let Some(google) = state.google() else {
        tracing::warn!(error = %FlowError::NotConfigured, "Google sign-in unavailable");
        push_toast(auth.session(), Toast::error(query.mode.failure_message())).await?;
        return Ok(Redirect::to(query.mode.failure_redirect()).into_response());
    };

    let csrf_state = random_token(STATE_LENGTH);
    let nonce = random_token(STATE_LENGTH);
    let session = auth.session();
    session.insert(keys::GOOGLE_OAUTH_STATE, &csrf_state).await?;
    session.insert(keys::GOOGLE_OAUTH_NONCE, &nonce).await?;
    session
        .insert(
            keys::GOOGLE_OAUTH_ORIGIN,
            FlowOrigin {
                mode: query.mode,
                intent: query.intent,
            },
        )
        .await?;

    Ok(Redirect::to(&google.authorization_url(&csrf_state, &nonce)).into_response())
}

/// Finish the Google flow.
pub async fn callback(
    State(state): State<AppState>,
    auth: AuthClient,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let session = auth.session();
    // Single use: clear before anything can fail
    let expected_state: Option<String> = session.remove(keys::GOOGLE_OAUTH_STATE).await?;
    let expected_nonce: Option<String> = session.remove(keys::GOOGLE_OAUTH_NONCE).await?;
    let origin: FlowOrigin = session
        .remove(keys::GOOGLE_OAUTH_ORIGIN)
        .await?
        .unwrap_or_default();

    let outcome = match state.google() {
        Some(google) => complete(google, &auth, query, expected_state, expected_nonce).await,
        None => Err(FlowError::NotConfigured),
    };

    match outcome {
        Ok(()) => {
            let intent = match origin.mode {
                FlowMode::Login => auth.take_intent(origin.intent.as_deref()).await?,
                FlowMode::Signup => None,
            };
            push_toast(auth.session(), Toast::success(origin.mode.success_message())).await?;
            Ok(Redirect::to(post_login_destination(intent.as_ref())).into_response())
        }
        Err(FlowError::Auth(AuthError::Session(e))) => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, mode = ?origin.mode, "Google sign-in failed");
            push_toast(auth.session(), Toast::error(origin.mode.failure_message())).await?;
            Ok(Redirect::to(origin.mode.failure_redirect()).into_response())
        }
    }
}

async fn complete(
    google: &GoogleOAuthClient,
    auth: &AuthClient,
    query: CallbackQuery,
    expected_state: Option<String>,
    expected_nonce: Option<String>,
) -> Result<(), FlowError> {
    if let Some(error) = query.error {
        return Err(FlowError::Denied(error));
    }
    match (query.state.as_deref(), expected_state.as_deref()) {
        (Some(got), Some(expected)) if got == expected => {}
        _ => return Err(FlowError::StateMismatch),
    }
    let code = query.code.ok_or(FlowError::MissingCode)?;
    let nonce = expected_nonce.ok_or(FlowError::StateMismatch)?;

    let id_token = google.exchange_code(&code).await?;
    let credential = google.credential(id_token, &nonce)?;
    auth.sign_in_with_idp(&credential).await?;
    Ok(())
}

//! Authentication extractors.
//!
//! [`AuthClient`] is the identity provider adapter for one browser client: it
//! keeps the provider tokens in the cookie session and is the only code that
//! publishes to the client's [`SessionObserver`]. [`RequireSession`] runs the
//! route guard in front of protected handlers.

use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use skillswap_core::navigation::{GuardDecision, NavigationIntent, Route, guard};
use skillswap_core::{Identity, SessionState};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::identity::{
    Credentials, FederatedCredential, IdentityProvider, ProfilePatch, ProviderError,
    ProviderSession, codes, random_token,
};
use crate::observer::{ClientId, SessionObserver, SessionSubscription};
use crate::state::AppState;

use super::session::keys;

const INTENT_NONCE_LENGTH: usize = 24;

/// Errors from session-changing operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider refused or could not be reached.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The cookie session could not be read or written.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Provider tokens as kept in the cookie session.
#[derive(Clone, Serialize, Deserialize)]
struct StoredTokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl StoredTokens {
    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl From<&ProviderSession> for StoredTokens {
    fn from(session: &ProviderSession) -> Self {
        Self {
            id_token: session.id_token.expose_secret().to_string(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
            expires_at: session.expires_at,
        }
    }
}

impl fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredTokens")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A navigation intent waiting for a login, keyed by a single-use nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingIntent {
    nonce: String,
    intent: NavigationIntent,
}

/// Identity provider adapter bound to one browser client.
#[derive(Clone)]
pub struct AuthClient {
    state: AppState,
    session: Session,
    client_id: ClientId,
    observer: SessionObserver,
}

impl AuthClient {
    /// Bind to the client identified by `session`, assigning it a client ID on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn new(
        state: AppState,
        session: Session,
    ) -> Result<Self, tower_sessions::session::Error> {
        let client_id = match session.get::<ClientId>(keys::CLIENT_ID).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.insert(keys::CLIENT_ID, id).await?;
                id
            }
        };
        let observer = state.sessions().observer(client_id).await;

        Ok(Self {
            state,
            session,
            client_id,
            observer,
        })
    }

    /// The cookie session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// This client's ID.
    #[must_use]
    pub const fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Subscribe to this client's session transitions.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        self.observer.subscribe()
    }

    /// Current session, resolving it through the provider when it is unknown
    /// or the stored ID token has expired.
    ///
    /// A provider that cannot be reached leaves the observer as it was, so an
    /// unresolved session stays `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie session cannot be read or written.
    pub async fn resolve(&self) -> Result<SessionState, tower_sessions::session::Error> {
        let current = self.observer.current();
        let Some(tokens) = self.tokens().await? else {
            self.observer.publish(SessionState::SignedOut);
            return Ok(SessionState::SignedOut);
        };
        if current.is_resolved() && !tokens.is_expired() {
            return Ok(current);
        }

        match self.revalidate(tokens).await {
            Ok(next) => {
                self.observer.publish(next.clone());
                Ok(next)
            }
            Err(AuthError::Provider(e)) => {
                tracing::warn!(error = %e, client_id = %self.client_id, "Could not resolve session");
                Ok(current)
            }
            Err(AuthError::Session(e)) => Err(e),
        }
    }

    async fn revalidate(&self, tokens: StoredTokens) -> Result<SessionState, AuthError> {
        let provider = self.state.identity();

        if !tokens.is_expired() {
            match provider.lookup(&tokens.id_token).await {
                Ok(identity) => return Ok(SessionState::SignedIn(identity)),
                Err(e) if !e.is_rejection() => return Err(e.into()),
                Err(e) => tracing::debug!(code = ?e.code(), "ID token rejected, refreshing"),
            }
        }

        match provider.refresh(&tokens.refresh_token).await {
            Ok(refreshed) => {
                self.store_tokens(&refreshed).await?;
                Ok(SessionState::SignedIn(refreshed.identity))
            }
            Err(e) if e.is_rejection() => {
                tracing::info!(code = ?e.code(), "Refresh token rejected, signing out");
                self.session
                    .remove::<StoredTokens>(keys::PROVIDER_TOKENS)
                    .await?;
                Ok(SessionState::SignedOut)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or a session store error.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let provider_session = self.state.identity().sign_in(credentials).await?;
        self.establish(provider_session).await
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or a session store error.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let provider_session = self.state.identity().sign_up(credentials).await?;
        self.establish(provider_session).await
    }

    /// Sign in with a federated id token.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or a session store error.
    pub async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, AuthError> {
        let provider_session = self.state.identity().sign_in_with_idp(credential).await?;
        self.establish(provider_session).await
    }

    async fn establish(&self, provider_session: ProviderSession) -> Result<Identity, AuthError> {
        // New session ID on privilege change
        self.session.cycle_id().await?;
        self.store_tokens(&provider_session).await?;

        let identity = provider_session.identity;
        set_sentry_user(&identity.uid, identity.email.as_deref());
        self.observer
            .publish(SessionState::SignedIn(identity.clone()));
        tracing::info!(uid = %identity.uid, "Signed in");
        Ok(identity)
    }

    /// Push display name and photo URL to the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's error (including when nobody is signed in), or a
    /// session store error.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Identity, AuthError> {
        let provider = self.state.identity();
        let tokens = self
            .tokens()
            .await?
            .ok_or_else(|| ProviderError::rejected(codes::INVALID_ID_TOKEN, "Not signed in"))?;

        let id_token = if tokens.is_expired() {
            let refreshed = provider.refresh(&tokens.refresh_token).await?;
            self.store_tokens(&refreshed).await?;
            refreshed.id_token.expose_secret().to_string()
        } else {
            tokens.id_token
        };

        let identity = provider.update_profile(&id_token, patch).await?;
        self.observer
            .publish(SessionState::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Sign out at the provider and forget the tokens.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, in which case nothing changes, or a
    /// session store error.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(tokens) = self.tokens().await? {
            self.state
                .identity()
                .sign_out(&tokens.refresh_token)
                .await?;
        }

        self.session
            .remove::<StoredTokens>(keys::PROVIDER_TOKENS)
            .await?;
        self.session
            .remove::<PendingIntent>(keys::PENDING_INTENT)
            .await?;
        self.observer.publish(SessionState::SignedOut);
        clear_sentry_user();
        tracing::info!(client_id = %self.client_id, "Signed out");
        Ok(())
    }

    /// Ask the provider to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.state.identity().send_password_reset(email).await
    }

    /// Remember where to go after login. Replaces any older pending intent.
    ///
    /// Returns the nonce to carry on the login URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn remember_intent(
        &self,
        intent: NavigationIntent,
    ) -> Result<String, tower_sessions::session::Error> {
        let nonce = random_token(INTENT_NONCE_LENGTH);
        let pending = PendingIntent {
            nonce: nonce.clone(),
            intent,
        };
        self.session.insert(keys::PENDING_INTENT, pending).await?;
        Ok(nonce)
    }

    /// The pending intent for `nonce`, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    async fn pending_intent(
        &self,
        nonce: Option<&str>,
    ) -> Result<Option<NavigationIntent>, tower_sessions::session::Error> {
        let Some(nonce) = nonce else {
            return Ok(None);
        };
        let pending: Option<PendingIntent> = self.session.get(keys::PENDING_INTENT).await?;
        Ok(pending
            .filter(|pending| pending.nonce == nonce)
            .map(|pending| pending.intent))
    }

    /// Consume the pending intent for `nonce`.
    ///
    /// A missing or mismatched nonce yields `None` and leaves the pending
    /// intent in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn take_intent(
        &self,
        nonce: Option<&str>,
    ) -> Result<Option<NavigationIntent>, tower_sessions::session::Error> {
        let intent = self.pending_intent(nonce).await?;
        if intent.is_some() {
            self.session
                .remove::<PendingIntent>(keys::PENDING_INTENT)
                .await?;
        }
        Ok(intent)
    }

    async fn tokens(&self) -> Result<Option<StoredTokens>, tower_sessions::session::Error> {
        self.session.get(keys::PROVIDER_TOKENS).await
    }

    async fn store_tokens(
        &self,
        provider_session: &ProviderSession,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(
                keys::PROVIDER_TOKENS,
                StoredTokens::from(provider_session),
            )
            .await
    }
}

impl FromRequestParts<AppState> for AuthClient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;
        Ok(Self::new(state.clone(), session).await?)
    }
}

/// Extractor for protected views: yields the signed-in identity or answers
/// with the route guard's decision.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireSession(identity): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", identity.label())
/// }
/// ```
pub struct RequireSession(pub Identity);

/// Why a protected view was not rendered.
#[derive(Debug)]
pub enum SessionRejection {
    /// Signed out: go to the login page carrying the intent nonce.
    RedirectToLogin(String),
    /// Session could not be resolved; neither render nor redirect.
    Pending,
    /// Session store failure.
    Error(AppError),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::Pending => AppError::SessionPending.into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthClient::from_request_parts(parts, state)
            .await
            .map_err(SessionRejection::Error)?;
        let current = auth
            .resolve()
            .await
            .map_err(|e| SessionRejection::Error(e.into()))?;
        let path = parts.uri.path();

        let decision = match guard(&current, path) {
            // Handlers behind this extractor always need an identity, even if
            // the path itself is not in the protected route table.
            GuardDecision::Render if !current.is_signed_in() => {
                gate_unlisted_path(&current, path)
            }
            decision => decision,
        };

        match decision {
            GuardDecision::Render => match current {
                SessionState::SignedIn(identity) => Ok(Self(identity)),
                SessionState::Unknown | SessionState::SignedOut => Err(SessionRejection::Pending),
            },
            GuardDecision::Redirect { target, intent } => {
                let nonce = auth
                    .remember_intent(intent)
                    .await
                    .map_err(|e| SessionRejection::Error(e.into()))?;
                Err(SessionRejection::RedirectToLogin(format!(
                    "{target}?intent={nonce}"
                )))
            }
            GuardDecision::Pending => Err(SessionRejection::Pending),
        }
    }
}

fn gate_unlisted_path(current: &SessionState, path: &str) -> GuardDecision {
    match current {
        SessionState::SignedOut => GuardDecision::Redirect {
            target: skillswap_core::navigation::paths::LOGIN,
            intent: NavigationIntent::new(Route::resolve(path).return_path()),
        },
        SessionState::Unknown | SessionState::SignedIn(_) => GuardDecision::Pending,
    }
}

//! Identity provider clients.
//!
//! # Architecture
//!
//! - The provider owns accounts, passwords and tokens; this crate never sees
//!   a password hash outside the in-process backend
//! - [`IdentityProvider`] is the seam; [`IdentityBackend`] picks an
//!   implementation from configuration
//! - Results come back as a [`ProviderSession`] (identity plus tokens) and the
//!   caller decides where the tokens live
//!
//! # Backends
//!
//! - [`MemoryProvider`] - in-process accounts, for local runs and tests
//! - [`FirebaseClient`] - Firebase Authentication REST API
//!
//! Federated sign-in (Google) is split in two: [`federated`] runs the OAuth
//! code flow and yields an OpenID id token, which is then handed to the
//! provider through [`IdentityProvider::sign_in_with_idp`].

pub mod federated;
mod firebase;
mod memory;

pub use firebase::FirebaseClient;
pub use memory::MemoryProvider;

use std::future::Future;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::SecretString;
use thiserror::Error;

use skillswap_core::Identity;

use crate::config::IdentityConfig;

/// Errors returned by identity provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the request (bad credentials, duplicate account, ...).
    ///
    /// `message` is the provider's own wording and is shown to users as-is.
    #[error("{message}")]
    Rejected { code: String, message: String },

    /// The provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with something we could not understand.
    #[error("unexpected identity provider response: {0}")]
    Protocol(String),
}

impl ProviderError {
    /// A rejection with the given provider error code.
    #[must_use]
    pub fn rejected(code: &str, message: &str) -> Self {
        Self::Rejected {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the provider itself refused the request, as opposed to a
    /// transport or protocol failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Provider error code, when rejected.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            Self::Transport(_) | Self::Protocol(_) => None,
        }
    }
}

/// Provider error codes shared by both backends (Firebase naming).
pub mod codes {
    pub const EMAIL_EXISTS: &str = "EMAIL_EXISTS";
    pub const EMAIL_NOT_FOUND: &str = "EMAIL_NOT_FOUND";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const INVALID_LOGIN_CREDENTIALS: &str = "INVALID_LOGIN_CREDENTIALS";
    pub const WEAK_PASSWORD: &str = "WEAK_PASSWORD";
    pub const INVALID_ID_TOKEN: &str = "INVALID_ID_TOKEN";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const INVALID_REFRESH_TOKEN: &str = "INVALID_REFRESH_TOKEN";
    pub const INVALID_IDP_RESPONSE: &str = "INVALID_IDP_RESPONSE";
    pub const OPERATION_NOT_ALLOWED: &str = "OPERATION_NOT_ALLOWED";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
}

/// Email/password pair submitted by a form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw form input.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Profile fields to change. Empty strings clear the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: String,
    pub photo_url: String,
}

/// An id token obtained from a federated identity provider.
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    /// Provider ID, e.g. `google.com`.
    pub provider_id: String,
    /// OpenID Connect id token.
    pub id_token: String,
    /// Redirect URI the token was obtained through.
    pub request_uri: String,
}

/// A signed-in session as issued by the provider.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub identity: Identity,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// Operations the application needs from an identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Create an account and sign it in.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Sign in (creating the account if needed) with a federated id token.
    fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> impl Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Current identity for an id token.
    fn lookup(&self, id_token: &str)
    -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Exchange a refresh token for fresh tokens.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Update display name and photo URL.
    fn update_profile(
        &self,
        id_token: &str,
        patch: &ProfilePatch,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Send a password reset email.
    fn send_password_reset(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// End a session on the provider side.
    fn sign_out(&self, refresh_token: &str)
    -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Identity provider chosen at startup.
#[derive(Clone)]
pub enum IdentityBackend {
    Memory(MemoryProvider),
    Firebase(FirebaseClient),
}

impl IdentityBackend {
    /// Build the backend described by `config`.
    #[must_use]
    pub fn from_config(config: &IdentityConfig, http: reqwest::Client) -> Self {
        match config {
            IdentityConfig::Memory { token_ttl } => Self::Memory(MemoryProvider::new(*token_ttl)),
            IdentityConfig::Firebase(firebase) => {
                Self::Firebase(FirebaseClient::new(firebase, http))
            }
        }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Firebase(_) => "firebase",
        }
    }
}

impl IdentityProvider for IdentityBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        match self {
            Self::Memory(p) => p.sign_in(credentials).await,
            Self::Firebase(p) => p.sign_in(credentials).await,
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        match self {
            Self::Memory(p) => p.sign_up(credentials).await,
            Self::Firebase(p) => p.sign_up(credentials).await,
        }
    }

    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderSession, ProviderError> {
        match self {
            Self::Memory(p) => p.sign_in_with_idp(credential).await,
            Self::Firebase(p) => p.sign_in_with_idp(credential).await,
        }
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, ProviderError> {
        match self {
            Self::Memory(p) => p.lookup(id_token).await,
            Self::Firebase(p) => p.lookup(id_token).await,
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        match self {
            Self::Memory(p) => p.refresh(refresh_token).await,
            Self::Firebase(p) => p.refresh(refresh_token).await,
        }
    }

    async fn update_profile(
        &self,
        id_token: &str,
        patch: &ProfilePatch,
    ) -> Result<Identity, ProviderError> {
        match self {
            Self::Memory(p) => p.update_profile(id_token, patch).await,
            Self::Firebase(p) => p.update_profile(id_token, patch).await,
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        match self {
            Self::Memory(p) => p.send_password_reset(email).await,
            Self::Firebase(p) => p.send_password_reset(email).await,
        }
    }

    async fn sign_out(&self, refresh_token: &str) -> Result<(), ProviderError> {
        match self {
            Self::Memory(p) => p.sign_out(refresh_token).await,
            Self::Firebase(p) => p.sign_out(refresh_token).await,
        }
    }
}

/// Random alphanumeric string for opaque tokens, nonces and OAuth state.
pub(crate) fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Treat an empty form value as "clear this field".
pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_shows_provider_message_verbatim() {
        let err = ProviderError::rejected("EMAIL_EXISTS", "EMAIL_EXISTS");
        assert_eq!(err.to_string(), "EMAIL_EXISTS");
        assert!(err.is_rejection());
        assert_eq!(err.code(), Some("EMAIL_EXISTS"));
    }

    #[test]
    fn test_protocol_error_is_not_rejection() {
        let err = ProviderError::Protocol("missing idToken".to_string());
        assert!(!err.is_rejection());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_random_token_shape() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(32));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("Maya"), Some("Maya".to_string()));
    }
}

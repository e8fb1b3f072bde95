//! "Continue with Google" via the OpenID Connect authorization code flow.
//!
//! # Flow
//!
//! 1. `/auth/google` stores a random `state` and `nonce` in the session and
//!    redirects to [`GoogleOAuthClient::authorization_url`]
//! 2. Google redirects back to `/auth/google/callback` with `code` and `state`
//! 3. [`GoogleOAuthClient::exchange_code`] trades the code for an id token
//! 4. The id token's nonce is checked, then the token goes to the identity
//!    provider as a [`FederatedCredential`](super::FederatedCredential)
//!
//! The id token's signature is verified by the identity provider; this module
//! only reads its claims.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleOAuthConfig;

use super::FederatedCredential;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Provider ID for Google accounts.
pub const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Path Google redirects back to.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Errors from the Google OAuth flow.
#[derive(Debug, Error)]
pub enum FederatedError {
    #[error("Google token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Google token exchange failed: {0}")]
    TokenExchange(String),

    #[error("malformed id token: {0}")]
    MalformedToken(String),

    #[error("id token nonce does not match")]
    NonceMismatch,
}

/// Claims read from a Google id token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Stable Google account ID.
    pub sub: String,
    pub email: Option<String>,
    /// Google vouches that `email` belongs to this account.
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub nonce: Option<String>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT without checking its signature.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the token is not three dot-separated
    /// segments or the payload is not base64url-encoded JSON with a `sub`.
    pub fn decode_unverified(token: &str) -> Result<Self, FederatedError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(FederatedError::MalformedToken(
                "expected three segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| FederatedError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FederatedError::MalformedToken(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

/// Google OAuth 2.0 client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    inner: Arc<GoogleOAuthClientInner>,
}

struct GoogleOAuthClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOAuthClient {
    /// Create a client redirecting back to `{base_url}/auth/google/callback`.
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(GoogleOAuthClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
                redirect_uri: format!("{base_url}{CALLBACK_PATH}"),
            }),
        }
    }

    /// Registered redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.inner.redirect_uri
    }

    /// URL of Google's account chooser for this login attempt.
    #[must_use]
    pub fn authorization_url(&self, state: &str, nonce: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            prompt=select_account&\
            state={}&\
            nonce={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(&self.inner.redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Exchange an authorization code for an id token.
    ///
    /// # Errors
    ///
    /// Returns an error if Google rejects the code or omits the id token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, FederatedError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.inner.redirect_uri.as_str()),
        ];

        let response = self.inner.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FederatedError::TokenExchange(text));
        }

        let token: TokenResponse = response.json().await?;
        token
            .id_token
            .ok_or_else(|| FederatedError::TokenExchange("no id_token in response".to_string()))
    }

    /// Check the id token belongs to this login attempt and wrap it for the
    /// identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed or its nonce differs from
    /// `expected_nonce`.
    pub fn credential(
        &self,
        id_token: String,
        expected_nonce: &str,
    ) -> Result<FederatedCredential, FederatedError> {
        let claims = IdTokenClaims::decode_unverified(&id_token)?;
        if claims.nonce.as_deref() != Some(expected_nonce) {
            return Err(FederatedError::NonceMismatch);
        }
        Ok(FederatedCredential {
            provider_id: GOOGLE_PROVIDER_ID.to_string(),
            id_token,
            request_uri: self.inner.redirect_uri.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> GoogleOAuthClient {
        let config = GoogleOAuthConfig {
            client_id: "123.apps.googleusercontent.com".to_string(),
            client_secret: SecretString::from("GOCSPX-aB3xY9mK2nL5pQ7rT0uW4zC6"),
        };
        GoogleOAuthClient::new(&config, "http://localhost:3000", reqwest::Client::new())
    }

    fn token(claims: &serde_json::Value) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn test_authorization_url() {
        let url = client().authorization_url("st ate", "n0nce");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=123.apps.googleusercontent.com"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("state=st%20ate"));
        assert!(url.contains("nonce=n0nce"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_decode_claims() {
        let claims = IdTokenClaims::decode_unverified(&token(&serde_json::json!({
            "sub": "42",
            "email": "rafi@example.com",
            "name": "Rafi Khan",
            "nonce": "abc",
        })))
        .unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.name.as_deref(), Some("Rafi Khan"));
        assert_eq!(claims.picture, None);
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        for bad in ["", "a.b", "a.b.c.d", "a.!!!.c"] {
            assert!(
                matches!(
                    IdTokenClaims::decode_unverified(bad),
                    Err(FederatedError::MalformedToken(_))
                ),
                "{bad}"
            );
        }
        let no_sub = token(&serde_json::json!({"email": "x@y.z"}));
        assert!(IdTokenClaims::decode_unverified(&no_sub).is_err());
    }

    #[test]
    fn test_credential_checks_nonce() {
        let client = client();
        let id_token = token(&serde_json::json!({"sub": "42", "nonce": "expected"}));

        let credential = client.credential(id_token.clone(), "expected").unwrap();
        assert_eq!(credential.provider_id, "google.com");
        assert_eq!(
            credential.request_uri,
            "http://localhost:3000/auth/google/callback"
        );

        assert!(matches!(
            client.credential(id_token, "other"),
            Err(FederatedError::NonceMismatch)
        ));
    }
}

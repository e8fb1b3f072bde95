//! Firebase Authentication REST client.
//!
//! Talks to the Identity Toolkit API (`identitytoolkit.googleapis.com/v1`)
//! for account operations and the Secure Token API for refreshes. Every call
//! is keyed by the project's web API key.
//!
//! Error bodies look like `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`;
//! the message becomes [`ProviderError::Rejected`] verbatim.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use skillswap_core::{Identity, UserId};

use crate::config::FirebaseConfig;

use super::{
    Credentials, FederatedCredential, IdentityProvider, ProfilePatch, ProviderError,
    ProviderSession, non_empty,
};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    delete_attribute: Vec<&'static str>,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

/// Response of `signInWithPassword`, `signUp` and `signInWithIdp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    /// Seconds, as a decimal string.
    expires_in: String,
    email: Option<String>,
    display_name: Option<String>,
    /// `signInWithIdp` names it `photoUrl`; `signInWithPassword` may omit it.
    #[serde(alias = "profilePicture")]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

/// Secure Token API uses snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<AccountInfo> for Identity {
    fn from(info: AccountInfo) -> Self {
        Self {
            uid: UserId::new(info.local_id),
            display_name: info.display_name.filter(|v| !v.is_empty()),
            email: info.email,
            photo_url: info.photo_url.filter(|v| !v.is_empty()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Firebase Authentication client.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<FirebaseClientInner>,
}

struct FirebaseClientInner {
    client: reqwest::Client,
    api_key: String,
    toolkit_url: String,
    secure_token_url: String,
}

impl FirebaseClient {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig, client: reqwest::Client) -> Self {
        // The emulator serves both APIs under their production host names
        let (toolkit_url, secure_token_url) = match &config.emulator_host {
            Some(host) => (
                format!("http://{host}/identitytoolkit.googleapis.com/v1"),
                format!("http://{host}/securetoken.googleapis.com/v1/token"),
            ),
            None => (
                IDENTITY_TOOLKIT_URL.to_string(),
                SECURE_TOKEN_URL.to_string(),
            ),
        };

        Self {
            inner: Arc::new(FirebaseClientInner {
                client,
                api_key: config.api_key.clone(),
                toolkit_url,
                secure_token_url,
            }),
        }
    }

    /// POST a JSON body to an Identity Toolkit `accounts:*` method.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/accounts:{method}?key={}",
            self.inner.toolkit_url,
            urlencoding::encode(&self.inner.api_key)
        );
        let response = self
            .inner
            .client
            .post(&url)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

/// Turn a response into `T`, or the provider's error message.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ProviderError::Protocol(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => {
            let message = envelope.error.message;
            // Messages look like "WEAK_PASSWORD : Password should be ..."
            let code = message
                .split_once(" : ")
                .map_or(message.as_str(), |(code, _)| code)
                .to_string();
            Err(ProviderError::Rejected { code, message })
        }
        Err(_) => Err(ProviderError::Protocol(format!("HTTP {status}: {text}"))),
    }
}

fn expires_at(expires_in: &str) -> Result<chrono::DateTime<Utc>, ProviderError> {
    let seconds: i64 = expires_in
        .parse()
        .map_err(|_| ProviderError::Protocol(format!("invalid expiresIn '{expires_in}'")))?;
    Ok(Utc::now() + TimeDelta::seconds(seconds))
}

impl TryFrom<AuthResponse> for ProviderSession {
    type Error = ProviderError;

    fn try_from(response: AuthResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            expires_at: expires_at(&response.expires_in)?,
            identity: Identity {
                uid: UserId::new(response.local_id),
                display_name: response.display_name.filter(|v| !v.is_empty()),
                email: response.email,
                photo_url: response.photo_url.filter(|v| !v.is_empty()),
            },
            id_token: SecretString::from(response.id_token),
            refresh_token: SecretString::from(response.refresh_token),
        })
    }
}

impl IdentityProvider for FirebaseClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        let body = PasswordRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
            return_secure_token: true,
        };
        let response: AuthResponse = self.call("signInWithPassword", &body).await?;
        ProviderSession::try_from(response)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        let body = PasswordRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
            return_secure_token: true,
        };
        let response: AuthResponse = self.call("signUp", &body).await?;
        ProviderSession::try_from(response)
    }

    #[instrument(skip(self, credential), fields(provider = %credential.provider_id))]
    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderSession, ProviderError> {
        let body = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                urlencoding::encode(&credential.id_token),
                urlencoding::encode(&credential.provider_id)
            ),
            request_uri: &credential.request_uri,
            return_secure_token: true,
            return_idp_credential: true,
        };
        let response: AuthResponse = self.call("signInWithIdp", &body).await?;
        ProviderSession::try_from(response)
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let response: LookupResponse = self
            .call("lookup", &IdTokenRequest { id_token })
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(Identity::from)
            .ok_or_else(|| ProviderError::Protocol("lookup returned no users".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let url = format!(
            "{}?key={}",
            self.inner.secure_token_url,
            urlencoding::encode(&self.inner.api_key)
        );
        let response = self
            .inner
            .client
            .post(&url)
            .form(&params)
            .send()
            .await?;
        let refreshed: RefreshResponse = decode(response).await?;

        // The token response carries no profile; fetch it with the new token.
        let mut identity = self.lookup(&refreshed.id_token).await?;
        identity.uid = UserId::new(refreshed.user_id);

        Ok(ProviderSession {
            identity,
            expires_at: expires_at(&refreshed.expires_in)?,
            id_token: SecretString::from(refreshed.id_token),
            refresh_token: SecretString::from(refreshed.refresh_token),
        })
    }

    #[instrument(skip(self, id_token, patch))]
    async fn update_profile(
        &self,
        id_token: &str,
        patch: &ProfilePatch,
    ) -> Result<Identity, ProviderError> {
        let display_name = non_empty(&patch.display_name);
        let photo_url = non_empty(&patch.photo_url);
        let mut delete_attribute = Vec::new();
        if display_name.is_none() {
            delete_attribute.push("DISPLAY_NAME");
        }
        if photo_url.is_none() {
            delete_attribute.push("PHOTO_URL");
        }

        let body = UpdateRequest {
            id_token,
            display_name,
            photo_url,
            delete_attribute,
            return_secure_token: false,
        };
        let updated: AccountInfo = self.call("update", &body).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let body = OobRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        let _: serde_json::Value = self.call("sendOobCode", &body).await?;
        Ok(())
    }

    /// Firebase has no per-session sign-out endpoint; the refresh token is
    /// simply discarded by the caller.
    async fn sign_out(&self, _refresh_token: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_to_session() {
        let response: AuthResponse = serde_json::from_value(serde_json::json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "abc123",
            "email": "maya@example.com",
            "displayName": "",
            "idToken": "id-token",
            "registered": true,
            "refreshToken": "refresh-token",
            "expiresIn": "3600"
        }))
        .unwrap();
        let session = ProviderSession::try_from(response).unwrap();
        assert_eq!(session.identity.uid.as_str(), "abc123");
        assert_eq!(session.identity.display_name, None);
        assert_eq!(session.id_token.expose_secret(), "id-token");
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn test_emulator_host_replaces_google_endpoints() {
        let hosted = FirebaseClient::new(
            &FirebaseConfig {
                api_key: "key".to_string(),
                emulator_host: None,
            },
            reqwest::Client::new(),
        );
        assert_eq!(hosted.inner.toolkit_url, IDENTITY_TOOLKIT_URL);

        let emulated = FirebaseClient::new(
            &FirebaseConfig {
                api_key: "key".to_string(),
                emulator_host: Some("127.0.0.1:9099".to_string()),
            },
            reqwest::Client::new(),
        );
        assert_eq!(
            emulated.inner.toolkit_url,
            "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1"
        );
        assert_eq!(
            emulated.inner.secure_token_url,
            "http://127.0.0.1:9099/securetoken.googleapis.com/v1/token"
        );
    }

    #[test]
    fn test_bad_expires_in_is_protocol_error() {
        assert!(matches!(
            expires_at("soon"),
            Err(ProviderError::Protocol(_))
        ));
    }

    #[test]
    fn test_update_request_deletes_empty_fields() {
        let body = UpdateRequest {
            id_token: "t",
            display_name: Some("Maya".to_string()),
            photo_url: None,
            delete_attribute: vec!["PHOTO_URL"],
            return_secure_token: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["displayName"], "Maya");
        assert!(json.get("photoUrl").is_none());
        assert_eq!(json["deleteAttribute"][0], "PHOTO_URL");
    }

    #[test]
    fn test_lookup_account_to_identity() {
        let info: AccountInfo = serde_json::from_value(serde_json::json!({
            "localId": "u1",
            "email": "a@b.co",
            "photoUrl": "https://img.example/a.png"
        }))
        .unwrap();
        let identity = Identity::from(info);
        assert_eq!(identity.avatar_url(), "https://img.example/a.png");
        assert_eq!(identity.label(), "a@b.co");
    }
}

//! In-process identity provider.
//!
//! Accounts live in memory and vanish on restart. Passwords are hashed with
//! Argon2id; ID tokens and refresh tokens are random opaque strings. Error
//! codes follow the Firebase REST API so both backends read the same to the
//! rest of the application.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use skillswap_core::validation::MIN_PASSWORD_LENGTH;
use skillswap_core::{Identity, UserId};

use super::federated::IdTokenClaims;
use super::{
    Credentials, FederatedCredential, IdentityProvider, ProfilePatch, ProviderError,
    ProviderSession, codes, non_empty, random_token,
};

const TOKEN_LENGTH: usize = 40;
const UID_LENGTH: usize = 28;

/// Unused refresh tokens are forgotten after this long, the same as the
/// cookie session that holds them.
const REFRESH_TOKEN_IDLE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// In-memory identity provider.
///
/// Cheap to clone; clones share the same accounts.
#[derive(Clone)]
pub struct MemoryProvider {
    token_ttl: Duration,
    store: Arc<Mutex<Store>>,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    /// Lowercased email -> uid
    by_email: HashMap<String, String>,
    /// `provider:subject` -> uid
    by_federated: HashMap<String, String>,
    id_tokens: HashMap<String, IssuedToken>,
    refresh_tokens: HashMap<String, RefreshGrant>,
    outbox: Vec<String>,
}

impl Store {
    /// Drop expired ID tokens and idle refresh tokens.
    fn prune(&mut self, now: DateTime<Utc>) {
        self.id_tokens.retain(|_, issued| issued.expires_at > now);
        let idle = TimeDelta::from_std(REFRESH_TOKEN_IDLE).unwrap_or(TimeDelta::days(7));
        self.refresh_tokens
            .retain(|_, grant| grant.last_used + idle > now);
    }
}

struct Account {
    identity: Identity,
    password_hash: Option<String>,
}

struct RefreshGrant {
    uid: String,
    last_used: DateTime<Utc>,
}

struct IssuedToken {
    uid: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl MemoryProvider {
    /// Create an empty provider issuing ID tokens valid for `token_ttl`.
    #[must_use]
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            token_ttl,
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Addresses that were sent a password reset email, oldest first.
    #[must_use]
    pub fn password_reset_outbox(&self) -> Vec<String> {
        self.lock().outbox.clone()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expiry(&self) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(self.token_ttl).unwrap_or(TimeDelta::hours(1));
        Utc::now() + ttl
    }

    /// Issue a fresh token pair for `uid`.
    fn issue(&self, store: &mut Store, uid: &str) -> Result<ProviderSession, ProviderError> {
        let identity = store
            .accounts
            .get(uid)
            .map(|account| account.identity.clone())
            .ok_or_else(|| ProviderError::rejected(codes::USER_NOT_FOUND, codes::USER_NOT_FOUND))?;

        let refresh_token = random_token(TOKEN_LENGTH);
        store.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                uid: uid.to_string(),
                last_used: Utc::now(),
            },
        );

        self.issue_id_token(store, identity, refresh_token)
    }

    fn issue_id_token(
        &self,
        store: &mut Store,
        identity: Identity,
        refresh_token: String,
    ) -> Result<ProviderSession, ProviderError> {
        store.prune(Utc::now());
        let id_token = random_token(TOKEN_LENGTH);
        let expires_at = self.expiry();
        store.id_tokens.insert(
            id_token.clone(),
            IssuedToken {
                uid: identity.uid.as_str().to_string(),
                refresh_token: refresh_token.clone(),
                expires_at,
            },
        );

        Ok(ProviderSession {
            identity,
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(refresh_token),
            expires_at,
        })
    }

    fn create_account(store: &mut Store, identity_of: impl FnOnce(UserId) -> Identity) -> String {
        let uid = random_token(UID_LENGTH);
        let identity = identity_of(UserId::new(uid.clone()));
        if let Some(email) = &identity.email {
            store.by_email.insert(email.to_lowercase(), uid.clone());
        }
        store.accounts.insert(
            uid.clone(),
            Account {
                identity,
                password_hash: None,
            },
        );
        uid
    }
}

/// Resolve a live ID token to its uid.
fn verify_id_token(store: &Store, id_token: &str) -> Result<String, ProviderError> {
    let issued = store
        .id_tokens
        .get(id_token)
        .ok_or_else(|| ProviderError::rejected(codes::INVALID_ID_TOKEN, codes::INVALID_ID_TOKEN))?;
    if issued.expires_at <= Utc::now() {
        return Err(ProviderError::rejected(
            codes::TOKEN_EXPIRED,
            codes::TOKEN_EXPIRED,
        ));
    }
    Ok(issued.uid.clone())
}

impl IdentityProvider for MemoryProvider {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        let invalid = || {
            ProviderError::rejected(
                codes::INVALID_LOGIN_CREDENTIALS,
                codes::INVALID_LOGIN_CREDENTIALS,
            )
        };

        let hash = {
            let store = self.lock();
            let uid = store
                .by_email
                .get(&credentials.email.to_lowercase())
                .ok_or_else(invalid)?;
            store
                .accounts
                .get(uid)
                .and_then(|account| account.password_hash.clone())
                .ok_or_else(invalid)?
        };

        verify_password(credentials.password.expose_secret(), &hash).map_err(|()| invalid())?;

        let mut store = self.lock();
        let uid = store
            .by_email
            .get(&credentials.email.to_lowercase())
            .cloned()
            .ok_or_else(invalid)?;
        self.issue(&mut store, &uid)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<ProviderSession, ProviderError> {
        if !looks_like_email(&credentials.email) {
            return Err(ProviderError::rejected(
                codes::INVALID_EMAIL,
                codes::INVALID_EMAIL,
            ));
        }
        if credentials.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProviderError::rejected(
                codes::WEAK_PASSWORD,
                &format!(
                    "{} : Password should be at least {MIN_PASSWORD_LENGTH} characters",
                    codes::WEAK_PASSWORD
                ),
            ));
        }

        let email_key = credentials.email.to_lowercase();
        if self.lock().by_email.contains_key(&email_key) {
            return Err(ProviderError::rejected(
                codes::EMAIL_EXISTS,
                codes::EMAIL_EXISTS,
            ));
        }

        let hash = hash_password(credentials.password.expose_secret())?;

        let mut store = self.lock();
        // Re-check: another sign-up may have won while hashing.
        if store.by_email.contains_key(&email_key) {
            return Err(ProviderError::rejected(
                codes::EMAIL_EXISTS,
                codes::EMAIL_EXISTS,
            ));
        }
        let uid = Self::create_account(&mut store, |uid| Identity {
            uid,
            display_name: None,
            email: Some(credentials.email.clone()),
            photo_url: None,
        });
        if let Some(account) = store.accounts.get_mut(&uid) {
            account.password_hash = Some(hash);
        }
        tracing::info!(uid = %uid, "Account created");
        self.issue(&mut store, &uid)
    }

    #[instrument(skip(self, credential), fields(provider = %credential.provider_id))]
    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderSession, ProviderError> {
        let claims = IdTokenClaims::decode_unverified(&credential.id_token).map_err(|e| {
            ProviderError::rejected(
                codes::INVALID_IDP_RESPONSE,
                &format!("{} : {e}", codes::INVALID_IDP_RESPONSE),
            )
        })?;
        let federated_key = format!("{}:{}", credential.provider_id, claims.sub);

        let mut store = self.lock();
        let by_email = claims
            .email
            .as_ref()
            .and_then(|email| store.by_email.get(&email.to_lowercase()).cloned());
        let existing = match store.by_federated.get(&federated_key).cloned() {
            Some(uid) => Some(uid),
            // Only a verified address may take over an existing account
            None if by_email.is_some() && !claims.email_verified => {
                return Err(ProviderError::rejected(
                    codes::EMAIL_EXISTS,
                    &format!(
                        "{} : unverified email matches an existing account",
                        codes::EMAIL_EXISTS
                    ),
                ));
            }
            None => by_email,
        };

        let uid = match existing {
            Some(uid) => uid,
            None => Self::create_account(&mut store, |uid| Identity {
                uid,
                display_name: claims.name.clone(),
                email: claims.email.clone(),
                photo_url: claims.picture.clone(),
            }),
        };
        store.by_federated.insert(federated_key, uid.clone());
        self.issue(&mut store, &uid)
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let store = self.lock();
        let uid = verify_id_token(&store, id_token)?;
        store
            .accounts
            .get(&uid)
            .map(|account| account.identity.clone())
            .ok_or_else(|| ProviderError::rejected(codes::USER_NOT_FOUND, codes::USER_NOT_FOUND))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        let mut store = self.lock();
        let grant = store.refresh_tokens.get_mut(refresh_token).ok_or_else(|| {
            ProviderError::rejected(codes::INVALID_REFRESH_TOKEN, codes::INVALID_REFRESH_TOKEN)
        })?;
        grant.last_used = Utc::now();
        let uid = grant.uid.clone();
        let identity = store
            .accounts
            .get(&uid)
            .map(|account| account.identity.clone())
            .ok_or_else(|| ProviderError::rejected(codes::USER_NOT_FOUND, codes::USER_NOT_FOUND))?;
        // The previous ID token is superseded
        store
            .id_tokens
            .retain(|_, issued| issued.refresh_token != refresh_token);
        self.issue_id_token(&mut store, identity, refresh_token.to_string())
    }

    #[instrument(skip(self, id_token, patch))]
    async fn update_profile(
        &self,
        id_token: &str,
        patch: &ProfilePatch,
    ) -> Result<Identity, ProviderError> {
        let mut store = self.lock();
        let uid = verify_id_token(&store, id_token)?;
        let account = store
            .accounts
            .get_mut(&uid)
            .ok_or_else(|| ProviderError::rejected(codes::USER_NOT_FOUND, codes::USER_NOT_FOUND))?;
        account.identity.display_name = non_empty(&patch.display_name);
        account.identity.photo_url = non_empty(&patch.photo_url);
        Ok(account.identity.clone())
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        if !looks_like_email(email) {
            return Err(ProviderError::rejected(
                codes::INVALID_EMAIL,
                codes::INVALID_EMAIL,
            ));
        }
        let mut store = self.lock();
        if !store.by_email.contains_key(&email.to_lowercase()) {
            return Err(ProviderError::rejected(
                codes::EMAIL_NOT_FOUND,
                codes::EMAIL_NOT_FOUND,
            ));
        }
        store.outbox.push(email.to_string());
        tracing::info!("Password reset email queued");
        Ok(())
    }

    async fn sign_out(&self, refresh_token: &str) -> Result<(), ProviderError> {
        let mut store = self.lock();
        store.refresh_tokens.remove(refresh_token);
        store
            .id_tokens
            .retain(|_, issued| issued.refresh_token != refresh_token);
        Ok(())
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, ProviderError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ProviderError::Protocol(format!("password hashing failed: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), ()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| ())?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ())
}

/// Same shape check the hosted provider applies: `local@domain.tld`.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn provider() -> MemoryProvider {
        MemoryProvider::new(Duration::from_secs(3600))
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials::new(email, password)
    }

    fn fake_id_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2ln")
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = provider();
        let created = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        assert_eq!(created.identity.email.as_deref(), Some("maya@example.com"));
        assert_eq!(created.identity.display_name, None);

        let session = provider
            .sign_in(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        assert_eq!(session.identity.uid, created.identity.uid);
    }

    #[tokio::test]
    async fn test_sign_in_email_is_case_insensitive() {
        let provider = provider();
        provider
            .sign_up(&creds("Maya@Example.com", "Secret1"))
            .await
            .unwrap();
        assert!(
            provider
                .sign_in(&creds("maya@example.com", "Secret1"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let provider = provider();
        provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();

        let wrong = provider
            .sign_in(&creds("maya@example.com", "Secret2"))
            .await
            .unwrap_err();
        let unknown = provider
            .sign_in(&creds("nobody@example.com", "Secret1"))
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), Some(codes::INVALID_LOGIN_CREDENTIALS));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let provider = provider();
        provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let err = provider
            .sign_up(&creds("MAYA@example.com", "Other1x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "EMAIL_EXISTS");
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_bad_email_and_short_password() {
        let provider = provider();
        let err = provider
            .sign_up(&creds("not-an-email", "Secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_EMAIL));

        let err = provider
            .sign_up(&creds("a@b.co", "Ab1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::WEAK_PASSWORD));
        assert!(err.to_string().contains("at least 6 characters"));
    }

    #[tokio::test]
    async fn test_lookup_and_expiry() {
        let provider = MemoryProvider::new(Duration::ZERO);
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let err = provider
            .lookup(session.id_token.expose_secret())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::TOKEN_EXPIRED));

        let err = provider.lookup("bogus").await.unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_ID_TOKEN));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_id_token() {
        let provider = provider();
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let refreshed = provider
            .refresh(session.refresh_token.expose_secret())
            .await
            .unwrap();
        assert_ne!(
            refreshed.id_token.expose_secret(),
            session.id_token.expose_secret()
        );
        let identity = provider
            .lookup(refreshed.id_token.expose_secret())
            .await
            .unwrap();
        assert_eq!(identity.uid, session.identity.uid);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_tokens() {
        let provider = provider();
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        provider
            .sign_out(session.refresh_token.expose_secret())
            .await
            .unwrap();

        assert!(
            provider
                .lookup(session.id_token.expose_secret())
                .await
                .is_err()
        );
        let err = provider
            .refresh(session.refresh_token.expose_secret())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_REFRESH_TOKEN));
    }

    #[tokio::test]
    async fn test_update_profile_sets_and_clears_fields() {
        let provider = provider();
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let token = session.id_token.expose_secret();

        let patch = ProfilePatch {
            display_name: "Maya Roy".to_string(),
            photo_url: "https://img.example/maya.png".to_string(),
        };
        let updated = provider.update_profile(token, &patch).await.unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Maya Roy"));
        assert_eq!(updated.label(), "Maya Roy");

        let cleared = provider
            .update_profile(token, &ProfilePatch::default())
            .await
            .unwrap();
        assert_eq!(cleared.display_name, None);
        assert_eq!(cleared.photo_url, None);
        assert_eq!(provider.lookup(token).await.unwrap(), cleared);
    }

    #[tokio::test]
    async fn test_password_reset_outbox() {
        let provider = provider();
        provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();

        provider
            .send_password_reset("maya@example.com")
            .await
            .unwrap();
        let err = provider
            .send_password_reset("ghost@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::EMAIL_NOT_FOUND));
        assert_eq!(provider.password_reset_outbox(), vec!["maya@example.com"]);
    }

    #[tokio::test]
    async fn test_federated_sign_in_creates_then_reuses_account() {
        let provider = provider();
        let credential = FederatedCredential {
            provider_id: "google.com".to_string(),
            id_token: fake_id_token(&serde_json::json!({
                "sub": "10987",
                "email": "nina@example.com",
                "name": "Nina Bose",
                "picture": "https://img.example/nina.png",
                "email_verified": true,
            })),
            request_uri: "http://localhost:3000/auth/google/callback".to_string(),
        };

        let first = provider.sign_in_with_idp(&credential).await.unwrap();
        assert_eq!(first.identity.display_name.as_deref(), Some("Nina Bose"));
        assert_eq!(
            first.identity.avatar_url(),
            "https://img.example/nina.png"
        );

        let second = provider.sign_in_with_idp(&credential).await.unwrap();
        assert_eq!(first.identity.uid, second.identity.uid);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_federated_sign_in_rejects_garbage_token() {
        let credential = FederatedCredential {
            provider_id: "google.com".to_string(),
            id_token: "not-a-jwt".to_string(),
            request_uri: String::new(),
        };
        let err = provider()
            .sign_in_with_idp(&credential)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_IDP_RESPONSE));
    }

    fn google_credential(claims: &serde_json::Value) -> FederatedCredential {
        FederatedCredential {
            provider_id: "google.com".to_string(),
            id_token: fake_id_token(claims),
            request_uri: String::new(),
        }
    }

    #[tokio::test]
    async fn test_federated_sign_in_links_verified_email_only() {
        let provider = provider();
        let password_account = provider
            .sign_up(&creds("nina@example.com", "Secret1"))
            .await
            .unwrap();

        let unverified = google_credential(&serde_json::json!({
            "sub": "111",
            "email": "nina@example.com",
            "email_verified": false,
        }));
        let err = provider.sign_in_with_idp(&unverified).await.unwrap_err();
        assert_eq!(err.code(), Some(codes::EMAIL_EXISTS));

        let missing_claim = google_credential(&serde_json::json!({
            "sub": "111",
            "email": "nina@example.com",
        }));
        assert!(provider.sign_in_with_idp(&missing_claim).await.is_err());
        assert_eq!(provider.account_count(), 1);

        let verified = google_credential(&serde_json::json!({
            "sub": "111",
            "email": "nina@example.com",
            "email_verified": true,
        }));
        let linked = provider.sign_in_with_idp(&verified).await.unwrap();
        assert_eq!(linked.identity.uid, password_account.identity.uid);
    }

    #[tokio::test]
    async fn test_token_maps_stay_bounded() {
        let provider = MemoryProvider::new(Duration::ZERO);
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let refresh_token = session.refresh_token.expose_secret().to_string();

        for _ in 0..200 {
            provider.refresh(&refresh_token).await.unwrap();
        }
        for _ in 0..20 {
            provider
                .sign_in(&creds("maya@example.com", "Secret1"))
                .await
                .unwrap();
        }

        let store = provider.lock();
        // Every issued ID token expired immediately, so at most the newest survives
        assert!(store.id_tokens.len() <= 1, "{} id tokens", store.id_tokens.len());
        assert_eq!(store.refresh_tokens.len(), 21);
    }

    #[tokio::test]
    async fn test_refresh_retires_previous_id_token() {
        let provider = provider();
        let session = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        let refreshed = provider
            .refresh(session.refresh_token.expose_secret())
            .await
            .unwrap();

        let err = provider
            .lookup(session.id_token.expose_secret())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_ID_TOKEN));
        assert!(provider.lookup(refreshed.id_token.expose_secret()).await.is_ok());
        assert_eq!(provider.lock().id_tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_idle_refresh_tokens_are_forgotten() {
        let provider = provider();
        let stale = provider
            .sign_up(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();
        {
            let mut store = provider.lock();
            let grant = store
                .refresh_tokens
                .get_mut(stale.refresh_token.expose_secret())
                .unwrap();
            grant.last_used -= TimeDelta::days(8);
        }

        provider
            .sign_in(&creds("maya@example.com", "Secret1"))
            .await
            .unwrap();

        let err = provider
            .refresh(stale.refresh_token.expose_secret())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_REFRESH_TOKEN));
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("plain"));
    }
}

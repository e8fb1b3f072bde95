//! Authenticated identity as published by the identity provider.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Avatar shown when the provider has no photo URL for the user.
pub const DEFAULT_AVATAR_URL: &str = "https://i.postimg.cc/Dz3T2h1b/avatar.png";

/// The signed-in user as known to the identity provider.
///
/// Every field except the ID is optional: federated accounts may lack an
/// email, and password accounts start without a display name or photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user ID.
    pub uid: UserId,
    /// Display name, if set.
    pub display_name: Option<String>,
    /// Email address, if known.
    pub email: Option<String>,
    /// Avatar URL, if set.
    pub photo_url: Option<String>,
}

impl Identity {
    /// Name to show in navigation: display name, then email, then the UID.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.uid.as_str())
    }

    /// Avatar URL, falling back to [`DEFAULT_AVATAR_URL`].
    #[must_use]
    pub fn avatar_url(&self) -> &str {
        self.photo_url.as_deref().unwrap_or(DEFAULT_AVATAR_URL)
    }
}

/// Session value observed by the application.
///
/// `Unknown` is distinct from `SignedOut`: it means the provider has not yet
/// reported anything for this client, and must never be treated as absence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "identity", rename_all = "snake_case")]
pub enum SessionState {
    /// Not yet resolved.
    #[default]
    Unknown,
    /// Resolved, no authenticated user.
    SignedOut,
    /// Resolved, authenticated.
    SignedIn(Identity),
}

impl SessionState {
    /// The identity, when signed in.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Unknown | Self::SignedOut => None,
        }
    }

    /// Whether the provider has reported a value yet.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

impl From<Option<Identity>> for SessionState {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::SignedOut, Self::SignedIn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            uid: UserId::new("u1"),
            display_name: None,
            email: Some("maya@example.com".to_string()),
            photo_url: None,
        }
    }

    #[test]
    fn test_label_prefers_display_name() {
        let mut user = identity();
        assert_eq!(user.label(), "maya@example.com");
        user.display_name = Some("Maya".to_string());
        assert_eq!(user.label(), "Maya");
        user.display_name = None;
        user.email = None;
        assert_eq!(user.label(), "u1");
    }

    #[test]
    fn test_avatar_fallback() {
        let mut user = identity();
        assert_eq!(user.avatar_url(), DEFAULT_AVATAR_URL);
        user.photo_url = Some("https://img.example/me.png".to_string());
        assert_eq!(user.avatar_url(), "https://img.example/me.png");
    }

    #[test]
    fn test_unknown_is_not_signed_out() {
        assert!(!SessionState::Unknown.is_resolved());
        assert!(SessionState::SignedOut.is_resolved());
        assert_ne!(SessionState::Unknown, SessionState::SignedOut);
        assert!(SessionState::Unknown.identity().is_none());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(SessionState::from(None), SessionState::SignedOut);
        let state = SessionState::from(Some(identity()));
        assert!(state.is_signed_in());
        assert_eq!(state.identity().unwrap().uid.as_str(), "u1");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(SessionState::SignedOut).unwrap();
        assert_eq!(json, serde_json::json!({"status": "signed_out"}));
    }
}

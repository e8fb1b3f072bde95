//! Route table and the session gate in front of protected views.
//!
//! The guard is a pure decision over `(session, path)`. It runs before any
//! view is built; the web layer only carries out the decision.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// Canonical paths.
pub mod paths {
    pub const CATALOG: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const SIGNUP: &str = "/signup";
    pub const LOGOUT: &str = "/logout";
    pub const PROFILE: &str = "/profile";
    pub const UPDATE_PROFILE: &str = "/update-profile";
    pub const FORGOT_PASSWORD: &str = "/forgot-password";
    pub const SKILL_PREFIX: &str = "/skill/";
}

/// A logical view, resolved from a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Catalog,
    /// `/skill/{id}`; the raw segment is kept so unknown IDs reach the view.
    SkillDetail(String),
    /// `/skill/{id}/book`
    SkillBooking(String),
    Login,
    Signup,
    Profile,
    UpdateProfile,
    ForgotPassword,
    /// Any other path, including auxiliary endpoints.
    Other(String),
}

impl Route {
    /// Resolve a request path (without query string).
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        match path {
            paths::CATALOG => return Self::Catalog,
            paths::LOGIN => return Self::Login,
            paths::SIGNUP => return Self::Signup,
            paths::PROFILE => return Self::Profile,
            paths::UPDATE_PROFILE => return Self::UpdateProfile,
            paths::FORGOT_PASSWORD => return Self::ForgotPassword,
            _ => {}
        }

        if let Some(rest) = path.strip_prefix(paths::SKILL_PREFIX) {
            match rest.split_once('/') {
                None if !rest.is_empty() => return Self::SkillDetail(rest.to_owned()),
                Some((id, "book")) if !id.is_empty() => {
                    return Self::SkillBooking(id.to_owned());
                }
                _ => {}
            }
        }

        Self::Other(path.to_owned())
    }

    /// Whether the view needs a signed-in session.
    #[must_use]
    pub const fn requires_session(&self) -> bool {
        matches!(
            self,
            Self::SkillDetail(_) | Self::SkillBooking(_) | Self::Profile | Self::UpdateProfile
        )
    }

    /// Path to come back to after login.
    ///
    /// Form endpoints map to the page that renders the form.
    #[must_use]
    pub fn return_path(&self) -> String {
        match self {
            Self::Catalog => paths::CATALOG.to_owned(),
            Self::SkillDetail(id) | Self::SkillBooking(id) => format!("{}{id}", paths::SKILL_PREFIX),
            Self::Login => paths::LOGIN.to_owned(),
            Self::Signup => paths::SIGNUP.to_owned(),
            Self::Profile => paths::PROFILE.to_owned(),
            Self::UpdateProfile => paths::UPDATE_PROFILE.to_owned(),
            Self::ForgotPassword => paths::FORGOT_PASSWORD.to_owned(),
            Self::Other(path) => path.clone(),
        }
    }
}

/// Where to send a visitor once they have signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationIntent {
    /// Originally requested path.
    pub requested_path: String,
}

impl NavigationIntent {
    /// Intent to return to `requested_path`.
    #[must_use]
    pub fn new(requested_path: impl Into<String>) -> Self {
        Self {
            requested_path: requested_path.into(),
        }
    }
}

/// Outcome of the session gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Build the requested view.
    Render,
    /// Send the visitor to `target`, remembering where they were going.
    Redirect {
        target: &'static str,
        intent: NavigationIntent,
    },
    /// Session not resolved yet; neither render nor redirect.
    Pending,
}

/// Decide whether `path` may be rendered for `session`.
#[must_use]
pub fn guard(session: &SessionState, path: &str) -> GuardDecision {
    let route = Route::resolve(path);
    if !route.requires_session() {
        return GuardDecision::Render;
    }

    match session {
        SessionState::SignedIn(_) => GuardDecision::Render,
        SessionState::Unknown => GuardDecision::Pending,
        SessionState::SignedOut => GuardDecision::Redirect {
            target: paths::LOGIN,
            intent: NavigationIntent::new(route.return_path()),
        },
    }
}

/// Destination after a successful login: the intent's path, else the catalog.
///
/// Paths that could leave the site (`//host`, `https://…`, backslashes) are
/// ignored.
#[must_use]
pub fn post_login_destination(intent: Option<&NavigationIntent>) -> &str {
    intent
        .map(|intent| intent.requested_path.as_str())
        .filter(|path| is_local_path(path))
        .unwrap_or(paths::CATALOG)
}

/// Whether `path` is an absolute path on this site.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

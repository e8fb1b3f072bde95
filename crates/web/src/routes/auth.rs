//! Email/password authentication handlers: login, signup and logout.
//!
//! Forms are validated locally before the identity provider is called. A
//! local failure or a provider rejection re-renders the form with the input
//! kept; success redirects with a queued toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use skillswap_core::navigation::{paths, post_login_destination};
use skillswap_core::validation::{PasswordStrength, validate_credentials, validate_signup};

use crate::error::AppError;
use crate::filters;
use crate::identity::{Credentials, ProfilePatch, ProviderError};
use crate::middleware::auth::{AuthClient, AuthError};
use crate::middleware::flash::{Toast, push_toast};
use crate::page::Page;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Pending navigation intent nonce, carried from the login URL.
    pub intent: Option<String>,
}

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub intent: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
    pub intent: Option<String>,
    pub errors: Vec<String>,
    pub google_enabled: bool,
}

impl LoginTemplate {
    /// Forgot-password link carrying the typed email.
    #[must_use]
    pub fn forgot_password_href(&self) -> String {
        if self.email.is_empty() {
            paths::FORGOT_PASSWORD.to_string()
        } else {
            format!(
                "{}?email={}",
                paths::FORGOT_PASSWORD,
                urlencoding::encode(&self.email)
            )
        }
    }

    /// Google entry point carrying the pending intent.
    #[must_use]
    pub fn google_href(&self) -> String {
        match &self.intent {
            Some(nonce) => format!("/auth/google?intent={}", urlencoding::encode(nonce)),
            None => "/auth/google".to_string(),
        }
    }
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub page: Page,
    pub name: String,
    pub photo_url: String,
    pub email: String,
    pub errors: Vec<String>,
    pub google_enabled: bool,
}

impl SignupTemplate {
    fn from_form(page: Page, form: SignupForm, errors: Vec<String>, state: &AppState) -> Self {
        Self {
            page,
            name: form.name,
            photo_url: form.photo_url,
            email: form.email,
            errors,
            google_enabled: state.google().is_some(),
        }
    }
}

/// Status for a failed provider call: rejections are the user's to fix,
/// anything else is the provider's fault.
const fn provider_failure_status(err: &ProviderError, rejected: StatusCode) -> StatusCode {
    if err.is_rejection() {
        rejected
    } else {
        StatusCode::BAD_GATEWAY
    }
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page; a signed-in visitor goes straight to the destination.
pub async fn login_page(
    State(state): State<AppState>,
    auth: AuthClient,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let session = auth.resolve().await?;
    if session.is_signed_in() {
        let intent = auth.take_intent(query.intent.as_deref()).await?;
        return Ok(Redirect::to(post_login_destination(intent.as_ref())).into_response());
    }

    Ok(LoginTemplate {
        page: Page::load(&auth).await?,
        email: String::new(),
        intent: query.intent,
        errors: Vec::new(),
        google_enabled: state.google().is_some(),
    }
    .into_response())
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    auth: AuthClient,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let render = |page: Page, form: LoginForm, errors: Vec<String>| LoginTemplate {
        page,
        email: form.email,
        intent: form.intent,
        errors,
        google_enabled: state.google().is_some(),
    };

    if let Err(err) = validate_credentials(&form.email, &form.password) {
        let page = Page::load(&auth)
            .await?
            .with_toast(Toast::error(format!("Login failed: {err}")));
        let errors = err.violations().iter().map(ToString::to_string).collect();
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(page, form, errors)).into_response());
    }

    let credentials = Credentials::new(form.email.clone(), std::mem::take(&mut form.password));
    match auth.sign_in(&credentials).await {
        Ok(_) => {
            let intent = auth.take_intent(form.intent.as_deref()).await?;
            push_toast(auth.session(), Toast::success("Logged in")).await?;
            Ok(Redirect::to(post_login_destination(intent.as_ref())).into_response())
        }
        Err(AuthError::Provider(e)) => {
            tracing::warn!(error = %e, code = ?e.code(), "Login failed");
            let status = provider_failure_status(&e, StatusCode::UNAUTHORIZED);
            let page = Page::load(&auth)
                .await?
                .with_toast(Toast::error(format!("Login failed: {e}")));
            Ok((status, render(page, form, Vec::new())).into_response())
        }
        Err(AuthError::Session(e)) => Err(e.into()),
    }
}

// =============================================================================
// Signup
// =============================================================================

/// Display the signup page.
pub async fn signup_page(State(state): State<AppState>, page: Page) -> impl IntoResponse {
    SignupTemplate::from_form(page, SignupForm::default(), Vec::new(), &state)
}

/// Handle signup form submission.
///
/// Creates the account, then pushes display name and photo URL. If only the
/// profile push fails the account stays signed in and an error toast says so.
pub async fn signup(
    State(state): State<AppState>,
    auth: AuthClient,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if let Err(err) = validate_signup(&form.email, &form.password) {
        let strength = PasswordStrength::of(&form.password);
        let message = if strength.is_strong() {
            format!("Signup failed: {err}")
        } else {
            format!("Password invalid. {strength}")
        };
        let page = Page::load(&auth).await?.with_toast(Toast::error(message));
        let errors = err.violations().iter().map(ToString::to_string).collect();
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            SignupTemplate::from_form(page, form, errors, &state),
        )
            .into_response());
    }

    let credentials = Credentials::new(form.email.clone(), std::mem::take(&mut form.password));
    match auth.sign_up(&credentials).await {
        Ok(identity) => {
            tracing::info!(uid = %identity.uid, "Account created");

            let patch = ProfilePatch {
                display_name: form.name,
                photo_url: form.photo_url,
            };
            match auth.update_profile(&patch).await {
                Ok(_) => push_toast(auth.session(), Toast::success("Account created")).await?,
                Err(AuthError::Provider(e)) => {
                    tracing::warn!(error = %e, uid = %identity.uid, "Profile push after signup failed");
                    push_toast(
                        auth.session(),
                        Toast::error(format!("Profile update failed: {e}")),
                    )
                    .await?;
                }
                Err(AuthError::Session(e)) => return Err(e.into()),
            }

            Ok(Redirect::to(paths::CATALOG).into_response())
        }
        Err(AuthError::Provider(e)) => {
            tracing::warn!(error = %e, code = ?e.code(), "Signup failed");
            let status = provider_failure_status(&e, StatusCode::BAD_REQUEST);
            let page = Page::load(&auth)
                .await?
                .with_toast(Toast::error(format!("Signup failed: {e}")));
            Ok((
                status,
                SignupTemplate::from_form(page, form, Vec::new(), &state),
            )
                .into_response())
        }
        Err(AuthError::Session(e)) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(auth: AuthClient) -> Result<Redirect, AppError> {
    match auth.sign_out().await {
        Ok(()) => push_toast(auth.session(), Toast::success("Logged out")).await?,
        Err(AuthError::Provider(e)) => {
            tracing::warn!(error = %e, "Logout failed");
            push_toast(auth.session(), Toast::error("Logout failed")).await?;
        }
        Err(AuthError::Session(e)) => return Err(e.into()),
    }
    Ok(Redirect::to(paths::CATALOG))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn login_template(email: &str, intent: Option<&str>) -> LoginTemplate {
        LoginTemplate {
            page: Page::default(),
            email: email.to_string(),
            intent: intent.map(String::from),
            errors: Vec::new(),
            google_enabled: true,
        }
    }

    #[test]
    fn test_forgot_password_link_carries_email() {
        assert_eq!(
            login_template("", None).forgot_password_href(),
            "/forgot-password"
        );
        assert_eq!(
            login_template("a+b@example.com", None).forgot_password_href(),
            "/forgot-password?email=a%2Bb%40example.com"
        );
    }

    #[test]
    fn test_google_link_carries_intent() {
        assert_eq!(login_template("", None).google_href(), "/auth/google");
        assert_eq!(
            login_template("", Some("abc")).google_href(),
            "/auth/google?intent=abc"
        );
    }

    #[test]
    fn test_login_template_keeps_intent_in_form() {
        let html = login_template("maya@example.com", Some("nonce123"))
            .render()
            .unwrap();
        assert!(html.contains("name=\"intent\" value=\"nonce123\""));
        assert!(html.contains("value=\"maya@example.com\""));
        assert!(html.contains("Continue with Google"));
    }

    #[test]
    fn test_provider_failure_status() {
        let rejected = ProviderError::rejected("INVALID_LOGIN_CREDENTIALS", "INVALID_LOGIN_CREDENTIALS");
        assert_eq!(
            provider_failure_status(&rejected, StatusCode::UNAUTHORIZED),
            StatusCode::UNAUTHORIZED
        );
        let broken = ProviderError::Protocol("bad json".to_string());
        assert_eq!(
            provider_failure_status(&broken, StatusCode::UNAUTHORIZED),
            StatusCode::BAD_GATEWAY
        );
    }
}

//! Password reset handlers.
//!
//! After the reset email is dispatched the visitor is sent on to an external
//! mail portal after a short delay, whether or not it hosts their mailbox.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use skillswap_core::validation::validate_reset_email;

use crate::config::PasswordResetConfig;
use crate::error::AppError;
use crate::filters;
use crate::middleware::auth::AuthClient;
use crate::middleware::flash::Toast;
use crate::page::Page;
use crate::state::AppState;

/// Reset form data; also the query of the page.
#[derive(Debug, Default, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub email: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: Page,
    pub email: String,
}

/// Shown after the reset email is sent, just before leaving for the portal.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_sent.html")]
pub struct ResetSentTemplate {
    pub page: Page,
    pub portal_url: String,
    pub delay_secs: u64,
}

/// `Refresh` header value for the portal redirect.
fn refresh_header(config: &PasswordResetConfig) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}; url={}",
        config.redirect_delay.as_secs(),
        config.portal_url
    ))
    .map_err(|e| AppError::Internal(format!("invalid reset portal URL: {e}")))
}

/// Display the forgot password page, pre-filled from `?email=`.
pub async fn forgot_password_page(
    page: Page,
    Query(query): Query<ResetForm>,
) -> impl IntoResponse {
    ForgotPasswordTemplate {
        page,
        email: query.email,
    }
}

/// Handle the reset form.
pub async fn forgot_password(
    State(state): State<AppState>,
    auth: AuthClient,
    Form(form): Form<ResetForm>,
) -> Result<Response, AppError> {
    if validate_reset_email(&form.email).is_err() {
        let page = Page::load(&auth).await?.with_toast(Toast::error("Enter email"));
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ForgotPasswordTemplate {
                page,
                email: form.email,
            },
        )
            .into_response());
    }

    if let Err(e) = auth.send_password_reset(&form.email).await {
        tracing::warn!(error = %e, code = ?e.code(), "Password reset failed");
        let status = if e.is_rejection() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::BAD_GATEWAY
        };
        let page = Page::load(&auth)
            .await?
            .with_toast(Toast::error(format!("Reset failed: {e}")));
        return Ok((
            status,
            ForgotPasswordTemplate {
                page,
                email: form.email,
            },
        )
            .into_response());
    }

    let config = &state.config().password_reset;
    let refresh = refresh_header(config)?;
    let page = Page::load(&auth)
        .await?
        .with_toast(Toast::success("Reset email sent. Redirecting to Gmail..."));

    Ok((
        [(HeaderName::from_static("refresh"), refresh)],
        ResetSentTemplate {
            page,
            portal_url: config.portal_url.clone(),
            delay_secs: config.redirect_delay.as_secs(),
        },
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_refresh_header_defaults() {
        let value = refresh_header(&PasswordResetConfig::default()).unwrap();
        assert_eq!(value, "1; url=https://mail.google.com");
    }

    #[test]
    fn test_refresh_header_custom() {
        let config = PasswordResetConfig {
            portal_url: "https://mail.example.org/inbox".to_string(),
            redirect_delay: Duration::from_secs(3),
        };
        assert_eq!(
            refresh_header(&config).unwrap(),
            "3; url=https://mail.example.org/inbox"
        );
    }

    #[test]
    fn test_reset_sent_has_meta_refresh() {
        let html = ResetSentTemplate {
            page: Page::default(),
            portal_url: "https://mail.google.com".to_string(),
            delay_secs: 1,
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"http-equiv="refresh" content="1; url=https://mail.google.com""#));
    }
}

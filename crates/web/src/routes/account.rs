//! Profile handlers. These routes require a signed-in session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use skillswap_core::Identity;
use skillswap_core::navigation::paths;

use crate::error::AppError;
use crate::filters;
use crate::identity::ProfilePatch;
use crate::middleware::auth::{AuthClient, AuthError, RequireSession};
use crate::middleware::flash::{Toast, push_toast};
use crate::page::Page;

/// Profile editor form data. Empty fields clear the value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: String,
}

impl From<&Identity> for ProfileForm {
    fn from(identity: &Identity) -> Self {
        Self {
            display_name: identity.display_name.clone().unwrap_or_default(),
            photo_url: identity.photo_url.clone().unwrap_or_default(),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: Page,
    pub user: Identity,
}

/// Profile editor template.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_profile.html")]
pub struct UpdateProfileTemplate {
    pub page: Page,
    pub form: ProfileForm,
}

/// Display the profile.
pub async fn profile(RequireSession(user): RequireSession, page: Page) -> impl IntoResponse {
    ProfileTemplate { page, user }
}

/// Display the profile editor, pre-filled from the session.
pub async fn update_profile_page(
    RequireSession(user): RequireSession,
    page: Page,
) -> impl IntoResponse {
    UpdateProfileTemplate {
        page,
        form: ProfileForm::from(&user),
    }
}

/// Push the edited profile to the identity provider.
pub async fn update_profile(
    RequireSession(_user): RequireSession,
    auth: AuthClient,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let patch = ProfilePatch {
        display_name: form.display_name.clone(),
        photo_url: form.photo_url.clone(),
    };

    match auth.update_profile(&patch).await {
        Ok(identity) => {
            tracing::info!(uid = %identity.uid, "Profile updated");
            push_toast(auth.session(), Toast::success("Profile updated")).await?;
            Ok(Redirect::to(paths::PROFILE).into_response())
        }
        Err(AuthError::Provider(e)) => {
            tracing::warn!(error = %e, code = ?e.code(), "Profile update failed");
            let page = Page::load(&auth).await?.with_toast(Toast::error("Update failed"));
            Ok(UpdateProfileTemplate { page, form }.into_response())
        }
        Err(AuthError::Session(e)) => Err(e.into()),
    }
}

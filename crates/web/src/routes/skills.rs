//! Skill detail and booking handlers (protected).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use skillswap_core::validation::validate_booking;

use crate::catalog::{self, Offering};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::auth::{AuthClient, RequireSession};
use crate::middleware::flash::{Toast, push_toast};
use crate::page::Page;

/// Booking form data. Nothing is persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Skill detail page with the booking form.
#[derive(Template, WebTemplate)]
#[template(path = "skills/detail.html")]
pub struct SkillDetailTemplate {
    pub page: Page,
    pub offering: &'static Offering,
    pub form: BookingForm,
    pub errors: Vec<String>,
}

/// Unknown skill ID.
#[derive(Template, WebTemplate)]
#[template(path = "skills/not_found.html")]
pub struct SkillNotFoundTemplate {
    pub page: Page,
}

fn skill_not_found(page: Page) -> Response {
    (StatusCode::NOT_FOUND, SkillNotFoundTemplate { page }).into_response()
}

/// Display a skill.
pub async fn show(
    RequireSession(_identity): RequireSession,
    Path(id): Path<String>,
    page: Page,
) -> Response {
    let Some(offering) = catalog::find_by_segment(&id) else {
        return skill_not_found(page);
    };

    SkillDetailTemplate {
        page,
        offering,
        form: BookingForm::default(),
        errors: Vec::new(),
    }
    .into_response()
}

/// Handle the booking form.
///
/// Missing name or email re-renders the form with the input kept; a valid
/// booking redirects back to the detail page with an empty form.
pub async fn book(
    RequireSession(identity): RequireSession,
    auth: AuthClient,
    Path(id): Path<String>,
    Form(form): Form<BookingForm>,
) -> Result<Response, AppError> {
    let Some(offering) = catalog::find_by_segment(&id) else {
        return Ok(skill_not_found(Page::load(&auth).await?));
    };

    if let Err(err) = validate_booking(&form.name, &form.email) {
        let page = Page::load(&auth)
            .await?
            .with_toast(Toast::error("Please fill name and email"));
        let errors = err.violations().iter().map(ToString::to_string).collect();
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            SkillDetailTemplate {
                page,
                offering,
                form,
                errors,
            },
        )
            .into_response());
    }

    let skill_id = offering.id.to_string();
    tracing::info!(skill_id = %skill_id, uid = %identity.uid, "Session booked");
    add_breadcrumb("booking", "Session booked", Some(&[("skill_id", skill_id.as_str())]));

    push_toast(auth.session(), Toast::success("Session booked successfully!")).await?;
    Ok(Redirect::to(&offering.path()).into_response())
}

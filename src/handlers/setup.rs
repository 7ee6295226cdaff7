use crate::error::NavError;
use crate::router::NavState;
use crate::service::site_settings::SiteSettings;
use crate::setup::{SetupForm, run_setup};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;

/// GET /setup -> the first-run form, or straight to `/login` once completed.
pub async fn setup_page(State(state): State<NavState>) -> Result<Response, NavError> {
    if state.ctx.is_setup_completed() {
        return Ok(Redirect::to("/login").into_response());
    }
    render_form(&state, &SetupForm::default(), None, StatusCode::OK)
}

/// POST /setup -> run the wizard; failures re-render the form with secrets blanked.
pub async fn setup_submit(
    State(state): State<NavState>,
    Form(form): Form<SetupForm>,
) -> Result<Response, NavError> {
    if state.ctx.is_setup_completed() {
        return Ok(Redirect::to("/login").into_response());
    }

    match run_setup(&state.ctx, &form).await {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(e @ (NavError::Validation(_) | NavError::StorageInit(_))) => render_form(
            &state,
            &form.without_secrets(),
            Some(e.to_string()),
            StatusCode::BAD_REQUEST,
        ),
        Err(e) => Err(e),
    }
}

// Storage may not hold a schema yet, so the form always uses default site settings.
fn render_form(
    state: &NavState,
    form: &SetupForm,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, NavError> {
    let html = state.templates.render(
        "setup.html",
        &json!({
            "site": SiteSettings::resolve(None),
            "form": form,
            "error": error,
        }),
    )?;
    Ok((status, Html(html)).into_response())
}

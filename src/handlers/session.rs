use crate::error::NavError;
use crate::handlers::site_settings;
use crate::middleware::RequireAdmin;
use crate::middleware::session::{end_session, session_user_id, start_session};
use crate::router::NavState;
use crate::service::password::verify_password;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(
    State(state): State<NavState>,
    jar: PrivateCookieJar,
) -> Result<Response, NavError> {
    if !state.ctx.is_setup_completed() {
        return Ok(Redirect::to("/setup").into_response());
    }
    if session_user_id(&jar).is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    render_login(&state, None, StatusCode::OK).await
}

pub async fn login_submit(
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, NavError> {
    if !state.ctx.is_setup_completed() {
        return Ok(Redirect::to("/setup").into_response());
    }
    if state.login_limiter.check().is_err() {
        warn!("login rate limit exceeded");
        return Err(NavError::RateLimited);
    }

    let storage = state.ctx.storage()?;
    let user = storage.find_user_by_username(form.username.trim()).await?;
    let verified = match &user {
        Some(user) => verify_password(&form.password, &user.password_hash)?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            info!(username = %user.username, "admin logged in");
            let jar = start_session(jar, user.id, state.secure_cookie);
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        _ => {
            render_login(
                &state,
                Some("invalid username or password"),
                StatusCode::UNAUTHORIZED,
            )
            .await
        }
    }
}

/// GET /logout -> drop the session and return to the index.
pub async fn logout(RequireAdmin(user): RequireAdmin, jar: PrivateCookieJar) -> impl IntoResponse {
    info!(username = %user.username, "admin logged out");
    (end_session(jar), Redirect::to("/"))
}

async fn render_login(
    state: &NavState,
    error: Option<&str>,
    status: StatusCode,
) -> Result<Response, NavError> {
    let storage = state.ctx.storage()?;
    let html = state.templates.render(
        "login.html",
        &json!({
            "site": site_settings(&storage).await,
            "error": error,
        }),
    )?;
    Ok((status, Html(html)).into_response())
}

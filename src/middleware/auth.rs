use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::PrivateCookieJar;

use crate::db::DbUser;
use crate::middleware::session::session_user_id;
use crate::router::NavState;

/// Resolve the logged-in admin from the private session cookie.
/// Redirects to `/setup` before setup has completed and to `/login` without a
/// valid session.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub DbUser);

impl FromRequestParts<NavState> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &NavState) -> Result<Self, Self::Rejection> {
        if !state.ctx.is_setup_completed() {
            return Err(Redirect::to("/setup").into_response());
        }

        let jar = match PrivateCookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let Some(user_id) = session_user_id(&jar) else {
            return Err(Redirect::to("/login").into_response());
        };

        let storage = state.ctx.storage().map_err(IntoResponse::into_response)?;
        match storage.find_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

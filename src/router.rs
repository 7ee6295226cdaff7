use crate::context::AppContext;
use crate::error::NavError;
use crate::handlers::{admin, browse, session, setup};
use crate::middleware::session::session_key;
use crate::templates::Templates;
use axum::{
    Json, Router,
    extract::{FromRef, State},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;

const LOGIN_ATTEMPTS_PER_MINUTE: NonZeroU32 = NonZeroU32::MIN.saturating_add(9);

#[derive(Clone)]
pub struct NavState {
    pub ctx: Arc<AppContext>,
    pub templates: Arc<Templates>,
    pub login_limiter: Arc<DefaultDirectRateLimiter>,
    pub secure_cookie: bool,
}

impl NavState {
    pub fn new(ctx: Arc<AppContext>, insecure_cookie: bool) -> Result<Self, NavError> {
        Ok(Self {
            ctx,
            templates: Arc::new(Templates::new()?),
            login_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(
                LOGIN_ATTEMPTS_PER_MINUTE,
            ))),
            secure_cookie: !insecure_cookie,
        })
    }
}

/// Cookies are keyed on the secret that is active right now, so a secret
/// adopted by setup takes effect on the next request.
impl FromRef<NavState> for Key {
    fn from_ref(state: &NavState) -> Self {
        session_key(&state.ctx.runtime().secret_key)
    }
}

pub fn nav_router(state: NavState) -> Router {
    Router::new()
        .route("/setup", get(setup::setup_page).post(setup::setup_submit))
        .route("/login", get(session::login_page).post(session::login_submit))
        .route("/logout", get(session::logout))
        .route("/", get(browse::index))
        .route("/visit/{id}", get(browse::visit))
        .route("/dashboard", get(admin::dashboard))
        .route("/link/add", post(admin::add_link))
        .route("/link/delete/{id}", post(admin::delete_link))
        .route("/category/add", post(admin::add_category))
        .route("/category/delete/{id}", post(admin::delete_category))
        .route("/settings/update", post(admin::update_settings))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz(State(state): State<NavState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "setup_completed": state.ctx.is_setup_completed(),
        "storage": state.ctx.storage_manager().current().is_some(),
    }))
}

use crate::error::NavError;
use crate::handlers::site_settings;
use crate::router::NavState;
use crate::service::groups::{GroupView, build_groups};
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::debug;

/// GET / -> hot links and every category with its links.
pub async fn index(State(state): State<NavState>) -> Result<Response, NavError> {
    if !state.ctx.is_setup_completed() {
        return Ok(Redirect::to("/setup").into_response());
    }

    let storage = state.ctx.storage()?;
    let categories = storage.list_categories().await?;
    let links = storage.list_links().await?;
    let groups = build_groups(categories, &links);
    let views: Vec<GroupView<'_>> = groups.iter().map(|g| g.view()).collect();

    let html = state.templates.render(
        "index.html",
        &json!({
            "site": site_settings(&storage).await,
            "groups": views,
            "total_links": links.len(),
        }),
    )?;
    Ok(Html(html).into_response())
}

/// GET /visit/{id} -> count the click and send the browser on to the link.
pub async fn visit(State(state): State<NavState>, Path(id): Path<i64>) -> Result<Redirect, NavError> {
    let storage = state.ctx.storage()?;
    match storage.record_click(id).await? {
        Some(url) => {
            debug!(link_id = id, "link visited");
            Ok(Redirect::to(&url))
        }
        None => Err(NavError::NotFound),
    }
}

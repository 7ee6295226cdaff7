//! Dashboard and the admin write endpoints. Every write answers with a
//! redirect back to `/dashboard` carrying a flash message.

use crate::db::NewLink;
use crate::error::NavError;
use crate::handlers::site_settings;
use crate::middleware::RequireAdmin;
use crate::middleware::session::{Flash, set_flash, take_flash};
use crate::router::NavState;
use crate::service::groups::{LinkGroup, group_by_category};
use crate::service::icons::icon_for_url;
use crate::service::site_settings::collect_updates;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LinkForm {
    pub title: String,
    pub url: String,
    pub description: String,
    pub icon: String,
    pub category_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub sort_order: String,
}

pub async fn dashboard(
    RequireAdmin(user): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
) -> Result<Response, NavError> {
    let (jar, flash) = take_flash(jar);
    let storage = state.ctx.storage()?;
    let categories = storage.list_categories().await?;
    let links = storage.list_links().await?;
    let total_links = storage.count_links().await?;
    let groups: Vec<LinkGroup> = group_by_category(categories, &links)
        .into_iter()
        .map(LinkGroup::Category)
        .collect();
    let views: Vec<_> = groups.iter().map(LinkGroup::view).collect();

    let html = state.templates.render(
        "dashboard.html",
        &json!({
            "site": site_settings(&storage).await,
            "username": user.username,
            "flash": flash,
            "groups": views,
            "total_links": total_links,
        }),
    )?;
    Ok((jar, Html(html)).into_response())
}

pub async fn add_link(
    RequireAdmin(_): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Form(form): Form<LinkForm>,
) -> Result<Response, NavError> {
    let storage = state.ctx.storage()?;
    let flash = match parse_link(&form) {
        Err(e) => Flash::error(e.to_string()),
        Ok(link) => {
            let known = storage
                .list_categories()
                .await?
                .iter()
                .any(|c| c.id == link.category_id);
            if known {
                let id = storage.add_link(link).await?;
                info!(link_id = id, "link added");
                Flash::success("Link added")
            } else {
                Flash::error("category does not exist")
            }
        }
    };
    Ok(back_to_dashboard(&state, jar, flash))
}

pub async fn delete_link(
    RequireAdmin(_): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
) -> Result<Response, NavError> {
    let storage = state.ctx.storage()?;
    let flash = if storage.delete_link(id).await? {
        info!(link_id = id, "link deleted");
        Flash::success("Link deleted")
    } else {
        Flash::error("link not found")
    };
    Ok(back_to_dashboard(&state, jar, flash))
}

pub async fn add_category(
    RequireAdmin(_): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Form(form): Form<CategoryForm>,
) -> Result<Response, NavError> {
    let storage = state.ctx.storage()?;
    let name = form.name.trim();
    let flash = match (name, parse_sort_order(&form.sort_order)) {
        ("", _) => Flash::error("category name is required"),
        (_, None) => Flash::error("sort order must be a number"),
        (name, Some(sort_order)) => {
            let id = storage.add_category(name, sort_order).await?;
            info!(category_id = id, name, "category added");
            Flash::success("Category added")
        }
    };
    Ok(back_to_dashboard(&state, jar, flash))
}

/// Deleting a category removes its links too.
pub async fn delete_category(
    RequireAdmin(_): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
) -> Result<Response, NavError> {
    let storage = state.ctx.storage()?;
    let flash = if storage.delete_category(id).await? {
        info!(category_id = id, "category deleted");
        Flash::success("Category deleted")
    } else {
        Flash::error("category not found")
    };
    Ok(back_to_dashboard(&state, jar, flash))
}

/// Only recognized keys with non-empty values are written.
pub async fn update_settings(
    RequireAdmin(_): RequireAdmin,
    State(state): State<NavState>,
    jar: PrivateCookieJar,
    Form(submitted): Form<HashMap<String, String>>,
) -> Result<Response, NavError> {
    let updates = collect_updates(submitted.iter().map(|(k, v)| (k.as_str(), v.trim())));
    let flash = if updates.is_empty() {
        Flash::error("nothing to update")
    } else {
        let entries: Vec<(&str, &str)> = updates.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        state.ctx.storage()?.upsert_site_settings(&entries).await?;
        info!(count = entries.len(), "site settings updated");
        Flash::success("Settings saved")
    };
    Ok(back_to_dashboard(&state, jar, flash))
}

fn parse_link(form: &LinkForm) -> Result<NewLink, NavError> {
    let title = form.title.trim();
    let url = form.url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(NavError::validation("title and url are required"));
    }
    let category_id = form
        .category_id
        .trim()
        .parse::<i64>()
        .map_err(|_| NavError::validation("a category is required"))?;

    let icon = match form.icon.trim() {
        "" => icon_for_url(url).to_string(),
        icon => icon.to_string(),
    };
    let description = Some(form.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NewLink {
        title: title.to_string(),
        url: url.to_string(),
        description,
        icon,
        category_id,
    })
}

fn parse_sort_order(raw: &str) -> Option<i64> {
    match raw.trim() {
        "" => Some(0),
        v => v.parse().ok(),
    }
}

fn back_to_dashboard(state: &NavState, jar: PrivateCookieJar, flash: Flash) -> Response {
    let jar = set_flash(jar, &flash, state.secure_cookie);
    (jar, Redirect::to("/dashboard")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_form(title: &str, url: &str, category_id: &str) -> LinkForm {
        LinkForm {
            title: title.into(),
            url: url.into(),
            category_id: category_id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn link_requires_title_url_and_category() {
        assert!(parse_link(&link_form("", "https://a.example", "1")).is_err());
        assert!(parse_link(&link_form("A", "  ", "1")).is_err());
        assert!(parse_link(&link_form("A", "https://a.example", "")).is_err());
        assert!(parse_link(&link_form("A", "https://a.example", "x")).is_err());
    }

    #[test]
    fn blank_icon_is_derived_from_url() {
        let link = parse_link(&link_form("Repo", "https://github.com/rust-lang", "2")).unwrap();
        assert_eq!(link.icon, "fab fa-github");
        assert_eq!(link.category_id, 2);
        assert_eq!(link.description, None);

        let mut form = link_form("Repo", "https://github.com/rust-lang", "2");
        form.icon = "fas fa-star".into();
        form.description = " code ".into();
        let link = parse_link(&form).unwrap();
        assert_eq!(link.icon, "fas fa-star");
        assert_eq!(link.description.as_deref(), Some("code"));
    }

    #[test]
    fn sort_order_defaults_to_zero() {
        assert_eq!(parse_sort_order(""), Some(0));
        assert_eq!(parse_sort_order(" 4 "), Some(4));
        assert_eq!(parse_sort_order("four"), None);
    }
}

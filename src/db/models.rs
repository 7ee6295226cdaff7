use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DbCategory {
    pub id: i64,
    pub name: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbLink {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub icon: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SiteSettingEntry {
    pub setting_key: String,
    pub setting_value: Option<String>,
}

/// Insert payload for a link; `created_at` and `clicks` are set by storage.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub icon: String,
    pub category_id: i64,
}

//! `forestnav init-db`: prepare a database outside the web wizard.

use crate::db::NavStorage;
use crate::error::NavError;
use crate::service::password::hash_password;
use tracing::info;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub admin_created: bool,
    pub categories_created: usize,
}

/// Create the schema, a default admin when none exists and the default
/// categories. Existing rows are left alone, so running it twice is harmless.
pub async fn init_db(storage: &NavStorage) -> Result<InitReport, NavError> {
    storage.init_schema().await?;

    let admin_created = match storage.find_user_by_username(DEFAULT_ADMIN_USERNAME).await? {
        Some(_) => false,
        None => {
            let hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
            storage.upsert_user(DEFAULT_ADMIN_USERNAME, &hash).await?;
            true
        }
    };
    let categories_created = storage.ensure_default_categories().await?;

    info!(admin_created, categories_created, "database initialized");
    Ok(InitReport {
        admin_created,
        categories_created,
    })
}

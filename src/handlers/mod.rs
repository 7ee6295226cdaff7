pub mod admin;
pub mod browse;
pub mod session;
pub mod setup;

use crate::db::NavStorage;
use crate::service::site_settings::SiteSettings;
use tracing::warn;

/// Effective site settings; storage failures degrade to the defaults.
pub(crate) async fn site_settings(storage: &NavStorage) -> SiteSettings {
    match storage.site_settings().await {
        Ok(entries) => SiteSettings::resolve(Some(&entries)),
        Err(e) => {
            warn!(error = %e, "site settings unavailable, using defaults");
            SiteSettings::resolve(None)
        }
    }
}

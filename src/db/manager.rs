use crate::db::storage::NavStorage;
use crate::error::NavError;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Owns the single active [`NavStorage`] and swaps it in place when the URL changes.
///
/// States are "absent" and "active". Requests that already cloned the previous
/// handle may finish against it.
#[derive(Debug, Default)]
pub struct StorageManager {
    current: ArcSwapOption<NavStorage>,
    initializations: AtomicU64,
    disposals: AtomicU64,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh pool to `url`, disposing whatever was active before.
    pub async fn initialize(&self, url: &str) -> Result<(), NavError> {
        let storage = NavStorage::connect_lazy(url)?;
        self.dispose().await;
        self.current.store(Some(Arc::new(storage)));
        self.initializations.fetch_add(1, Ordering::Relaxed);
        info!(database_url = %redact_url(url), "storage initialized");
        Ok(())
    }

    /// Take the active handle out and close it. Closing a pool cannot fail.
    pub async fn dispose(&self) {
        let Some(old) = self.current.swap(None) else {
            return;
        };
        old.close().await;
        self.disposals.fetch_add(1, Ordering::Relaxed);
        debug!(database_url = %redact_url(old.url()), "storage disposed");
    }

    pub fn current(&self) -> Option<Arc<NavStorage>> {
        self.current.load_full()
    }

    /// The active handle, or `StorageUnavailable` while absent.
    pub fn get(&self) -> Result<Arc<NavStorage>, NavError> {
        self.current().ok_or(NavError::StorageUnavailable)
    }

    pub fn initializations(&self) -> u64 {
        self.initializations.load(Ordering::Relaxed)
    }

    pub fn disposals(&self) -> u64 {
        self.disposals.load(Ordering::Relaxed)
    }
}

/// Mask the password part of a connection string for logging.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_replaces_and_disposes_previous_handle() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let a = crate::config::sqlite_url(&dir.path().join("a.db"));
        let b = crate::config::sqlite_url(&dir.path().join("b.db"));
        let manager = StorageManager::new();
        assert!(manager.current().is_none());
        assert!(matches!(manager.get(), Err(NavError::StorageUnavailable)));

        manager.initialize(&a).await.unwrap();
        assert_eq!((manager.initializations(), manager.disposals()), (1, 0));

        manager.initialize(&b).await.unwrap();
        assert_eq!((manager.initializations(), manager.disposals()), (2, 1));
        assert_eq!(manager.get().unwrap().url(), b);
    }

    #[tokio::test]
    async fn dispose_when_absent_is_a_no_op() {
        let manager = StorageManager::new();
        manager.dispose().await;
        assert_eq!(manager.disposals(), 0);
    }

    #[tokio::test]
    async fn bad_url_keeps_current_handle() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let a = crate::config::sqlite_url(&dir.path().join("a.db"));
        let manager = StorageManager::new();
        manager.initialize(&a).await.unwrap();

        assert!(manager.initialize("ftp://nowhere").await.is_err());
        assert_eq!(manager.get().unwrap().url(), a);
        assert_eq!(manager.disposals(), 0);
    }

    #[test]
    fn redact_hides_password_only() {
        assert_eq!(
            redact_url("mysql://nav:hunter2@db:3306/nav"),
            "mysql://nav:***@db:3306/nav"
        );
        assert_eq!(redact_url("sqlite://data/app.db?mode=rwc"), "sqlite://data/app.db?mode=rwc");
    }
}

use crate::config::{self, Config, EnvOverrides, RuntimeConfig};
use crate::db::{NavStorage, StorageManager};
use crate::error::NavError;
use crate::setup::store::{SetupConfig, SetupStore};
use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// Process-wide state shared by every handler: the active runtime config, the
/// storage handle bound to it, and the setup document on disk.
///
/// The runtime config only changes through [`AppContext::apply_config`].
#[derive(Debug)]
pub struct AppContext {
    runtime: ArcSwap<RuntimeConfig>,
    storage: StorageManager,
    store: SetupStore,
    data_dir: PathBuf,
}

impl AppContext {
    /// Resolve the boot-time runtime config from env, the saved document and
    /// defaults, then bind storage to it.
    ///
    /// A storage URL that cannot be used leaves storage absent instead of failing boot.
    pub async fn bootstrap(cfg: &Config, env: &EnvOverrides) -> Result<Self, NavError> {
        fs::create_dir_all(&cfg.data_dir).await?;
        let store = SetupStore::new(cfg.setup_path());
        let saved = store.read().await;
        let runtime = config::resolve(env, &saved, &cfg.runtime_defaults());

        let storage = StorageManager::new();
        if let Err(e) = storage.initialize(&runtime.database_url).await {
            warn!(error = %e, "storage not initialized at boot");
        }

        info!(
            setup_file = %store.path().display(),
            setup_completed = runtime.setup_completed,
            "runtime configuration resolved"
        );

        Ok(Self {
            runtime: ArcSwap::from_pointee(runtime),
            storage,
            store,
            data_dir: cfg.data_dir.clone(),
        })
    }

    pub fn runtime(&self) -> Arc<RuntimeConfig> {
        self.runtime.load_full()
    }

    pub fn is_setup_completed(&self) -> bool {
        self.runtime.load().setup_completed
    }

    pub fn storage(&self) -> Result<Arc<NavStorage>, NavError> {
        self.storage.get()
    }

    pub fn storage_manager(&self) -> &StorageManager {
        &self.storage
    }

    pub fn setup_store(&self) -> &SetupStore {
        &self.store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Overlay `doc` onto the runtime config.
    ///
    /// - empty `doc`: only `setup_completed` is cleared; storage untouched.
    /// - `secret_key`: adopted when present and non-empty.
    /// - `database_url`: adopted when present, non-empty and different; with
    ///   `reinit`, the storage handle is rebuilt against it before the new
    ///   runtime config is published, so a URL that cannot be bound changes nothing.
    /// - `setup_completed`: always taken from `doc` (absent means false).
    ///
    /// Returns the document that was applied.
    pub async fn apply_config(&self, doc: &SetupConfig, reinit: bool) -> Result<SetupConfig, NavError> {
        let mut next = RuntimeConfig::clone(&self.runtime.load());

        if doc.is_empty() {
            next.setup_completed = false;
            self.runtime.store(Arc::new(next));
            return Ok(SetupConfig::default());
        }

        if let Some(secret_key) = non_empty(&doc.secret_key) {
            next.secret_key = secret_key.to_string();
        }

        if let Some(url) = non_empty(&doc.database_url)
            && url != next.database_url
        {
            if reinit {
                self.storage.initialize(url).await?;
            }
            next.database_url = url.to_string();
        }

        next.setup_completed = doc.is_completed();
        self.runtime.store(Arc::new(next));
        Ok(doc.clone())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

//! Process configuration and the runtime configuration resolver.
//!
//! Two layers live here:
//! - [`Config`]: how the process runs (listen address, log level, data directory).
//!   Loaded once at boot through figment: defaults, then `forestnav.toml`, then
//!   `FORESTNAV_*` environment variables.
//! - [`RuntimeConfig`]: the active secret key, database URL and setup flag.
//!   Resolved from `SECRET_KEY`/`DATABASE_URL`, the saved setup document and
//!   defaults, then replaced only through `AppContext::apply_config`.

use crate::setup::store::SetupConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "forestnav.toml";
pub const SETUP_FILE_NAME: &str = "setup.json";
pub const DEFAULT_DATABASE_FILE: &str = "app.db";
pub const DEV_SECRET_KEY: &str = "dev-secret-key-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,
    /// Holds `setup.json` and the default SQLite database.
    pub data_dir: PathBuf,
    /// Drop the `Secure` attribute from the session cookie (plain-HTTP deployments).
    pub insecure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            data_dir: PathBuf::from("data"),
            insecure_cookie: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("FORESTNAV_"))
            .extract()
    }

    pub fn setup_path(&self) -> PathBuf {
        self.data_dir.join(SETUP_FILE_NAME)
    }

    pub fn runtime_defaults(&self) -> RuntimeDefaults {
        RuntimeDefaults {
            secret_key: DEV_SECRET_KEY.to_string(),
            database_url: sqlite_url(&self.data_dir.join(DEFAULT_DATABASE_FILE)),
        }
    }
}

/// Build a SQLite connection string that creates the file on first connect.
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Values the runtime config falls back to when neither env nor disk provide one.
#[derive(Debug, Clone)]
pub struct RuntimeDefaults {
    pub secret_key: String,
    pub database_url: String,
}

/// `SECRET_KEY` / `DATABASE_URL` as seen at boot. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub secret_key: Option<String>,
    pub database_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            secret_key: dotenvy::var("SECRET_KEY").ok(),
            database_url: dotenvy::var("DATABASE_URL").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub secret_key: String,
    pub database_url: String,
    pub setup_completed: bool,
}

/// Merge env, the saved setup document and defaults into the boot-time runtime config.
pub fn resolve(env: &EnvOverrides, saved: &SetupConfig, defaults: &RuntimeDefaults) -> RuntimeConfig {
    RuntimeConfig {
        secret_key: pick(&env.secret_key, &saved.secret_key, &defaults.secret_key),
        database_url: pick(&env.database_url, &saved.database_url, &defaults.database_url),
        setup_completed: saved.is_completed(),
    }
}

fn pick(env_value: &Option<String>, saved_value: &Option<String>, fallback: &str) -> String {
    non_empty(env_value)
        .or_else(|| non_empty(saved_value))
        .unwrap_or(fallback)
        .to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RuntimeDefaults {
        RuntimeDefaults {
            secret_key: DEV_SECRET_KEY.to_string(),
            database_url: "sqlite://data/app.db?mode=rwc".to_string(),
        }
    }

    #[test]
    fn env_wins_over_saved_document() {
        let env = EnvOverrides {
            secret_key: Some("env-secret".into()),
            database_url: Some("mysql://env/db".into()),
        };
        let saved = SetupConfig {
            secret_key: Some("saved-secret".into()),
            database_url: Some("sqlite://saved.db".into()),
            setup_completed: Some(true),
        };

        let cfg = resolve(&env, &saved, &defaults());
        assert_eq!(cfg.secret_key, "env-secret");
        assert_eq!(cfg.database_url, "mysql://env/db");
        assert!(cfg.setup_completed);
    }

    #[test]
    fn saved_document_wins_over_defaults() {
        let saved = SetupConfig {
            secret_key: Some("saved-secret".into()),
            database_url: None,
            setup_completed: None,
        };

        let cfg = resolve(&EnvOverrides::default(), &saved, &defaults());
        assert_eq!(cfg.secret_key, "saved-secret");
        assert_eq!(cfg.database_url, "sqlite://data/app.db?mode=rwc");
        assert!(!cfg.setup_completed);
    }

    #[test]
    fn empty_env_values_fall_through() {
        let env = EnvOverrides {
            secret_key: Some(String::new()),
            database_url: None,
        };

        let cfg = resolve(&env, &SetupConfig::default(), &defaults());
        assert_eq!(cfg.secret_key, DEV_SECRET_KEY);
    }

    #[test]
    fn default_database_lives_in_data_dir() {
        let cfg = Config {
            data_dir: PathBuf::from("/srv/nav"),
            ..Config::default()
        };
        assert_eq!(
            cfg.runtime_defaults().database_url,
            "sqlite:///srv/nav/app.db?mode=rwc"
        );
        assert_eq!(cfg.setup_path(), PathBuf::from("/srv/nav/setup.json"));
    }
}

//! First-run setup flow.
//!
//! Gate -> Form -> Validating -> Committed, or back to Form on failure.
//! Validation short-circuits in this order: credentials present, password
//! length, connection string, then a trial run against the new storage.
//! Nothing is written to disk until the trial has succeeded.

use crate::config::{RuntimeConfig, sqlite_url};
use crate::context::AppContext;
use crate::error::NavError;
use crate::service::password;
use crate::setup::store::SetupConfig;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const DEFAULT_SQLITE_FILE: &str = "app.db";
pub const DEFAULT_MYSQL_HOST: &str = "localhost";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
const GENERATED_SECRET_LEN: usize = 48;

/// Everything the setup page submits. Blank fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupForm {
    pub username: String,
    pub password: String,
    pub secret_key: String,
    pub db_engine: String,
    pub sqlite_file: String,
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    /// Raw connection string; when set it overrides every engine field.
    pub database_url: String,
}

impl SetupForm {
    /// Copy for re-rendering after a failure: secrets are blanked and any
    /// password embedded in the raw connection string is dropped.
    pub fn without_secrets(&self) -> Self {
        Self {
            password: String::new(),
            secret_key: String::new(),
            db_password: String::new(),
            database_url: strip_url_password(&self.database_url),
            ..self.clone()
        }
    }
}

fn strip_url_password(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    Sqlite,
    MySql,
}

impl DbEngine {
    pub fn parse(raw: &str) -> Result<Self, NavError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "sqlite" => Ok(DbEngine::Sqlite),
            "mysql" | "mariadb" => Ok(DbEngine::MySql),
            other => Err(NavError::validation(format!(
                "unsupported database engine: {other}"
            ))),
        }
    }
}

/// Steps 1 and 2: both credentials present, password long enough.
pub fn validate_credentials(form: &SetupForm) -> Result<(), NavError> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(NavError::validation("username and password are required"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(NavError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Step 3: the raw override wins, otherwise build from the engine fields.
/// Relative SQLite file names are placed under `data_dir`.
pub fn build_database_url(form: &SetupForm, data_dir: &Path) -> Result<String, NavError> {
    let raw = form.database_url.trim();
    if !raw.is_empty() {
        return Ok(raw.to_string());
    }

    match DbEngine::parse(&form.db_engine)? {
        DbEngine::Sqlite => {
            let file = non_empty_or(&form.sqlite_file, DEFAULT_SQLITE_FILE);
            let path = Path::new(file);
            if path.is_absolute() {
                Ok(sqlite_url(path))
            } else {
                Ok(sqlite_url(&data_dir.join(path)))
            }
        }
        DbEngine::MySql => mysql_url(form),
    }
}

fn mysql_url(form: &SetupForm) -> Result<String, NavError> {
    let db_name = form.db_name.trim();
    if db_name.is_empty() {
        return Err(NavError::validation("database name is required for MySQL"));
    }
    let host = non_empty_or(&form.db_host, DEFAULT_MYSQL_HOST);
    let port = match form.db_port.trim() {
        "" => DEFAULT_MYSQL_PORT,
        p => p
            .parse::<u16>()
            .map_err(|_| NavError::validation(format!("invalid database port: {p}")))?,
    };

    let invalid_host = || NavError::validation(format!("invalid database host: {host}"));
    let mut url = Url::parse(&format!("mysql://{host}")).map_err(|_| invalid_host())?;
    url.set_port(Some(port)).map_err(|_| invalid_host())?;

    // Url percent-encodes userinfo, so reserved characters survive the round trip.
    let user = form.db_user.trim();
    if !user.is_empty() {
        url.set_username(user).map_err(|_| invalid_host())?;
    }
    if !form.db_password.is_empty() {
        url.set_password(Some(&form.db_password))
            .map_err(|_| invalid_host())?;
    }
    url.set_path(&format!("/{db_name}"));
    Ok(url.to_string())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    match value.trim() {
        "" => fallback,
        v => v,
    }
}

pub fn generate_secret_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Run the whole flow. On success the committed document is returned and has
/// been written to disk and applied; on failure the runtime is back on its
/// last known-good configuration.
pub async fn run_setup(ctx: &AppContext, form: &SetupForm) -> Result<SetupConfig, NavError> {
    if ctx.is_setup_completed() {
        return Err(NavError::validation("setup has already been completed"));
    }

    validate_credentials(form)?;
    let database_url = build_database_url(form, ctx.data_dir())?;
    let secret_key = match form.secret_key.trim() {
        "" => generate_secret_key(),
        key => key.to_string(),
    };
    let username = form.username.trim();
    let password_hash = password::hash_password(&form.password)?;

    let previous = ctx.runtime();
    let trial = SetupConfig {
        secret_key: Some(secret_key.clone()),
        database_url: Some(database_url.clone()),
        setup_completed: Some(false),
    };
    if let Err(e) = trial_commit(ctx, &trial, username, &password_hash).await {
        warn!(error = %e, "setup trial failed; rolling back");
        rollback(ctx, &previous).await;
        return Err(as_setup_failure(e));
    }

    let committed = SetupConfig {
        setup_completed: Some(true),
        ..trial
    };
    if let Err(e) = persist(ctx, &committed).await {
        warn!(error = %e, "setup could not be saved; rolling back");
        rollback(ctx, &previous).await;
        return Err(as_setup_failure(e));
    }

    info!(username, "setup completed");
    Ok(committed)
}

async fn trial_commit(
    ctx: &AppContext,
    trial: &SetupConfig,
    username: &str,
    password_hash: &str,
) -> Result<(), NavError> {
    ctx.apply_config(trial, true).await?;
    let storage = ctx.storage()?;
    storage.init_schema().await?;
    storage.bootstrap_admin(username, password_hash).await?;
    Ok(())
}

async fn persist(ctx: &AppContext, committed: &SetupConfig) -> Result<(), NavError> {
    ctx.setup_store().write(committed).await?;
    ctx.apply_config(committed, true).await?;
    Ok(())
}

/// Re-apply the saved document. Keys it lacks take the value that was active
/// before the flow started, so storage always returns to its pre-flow binding.
async fn rollback(ctx: &AppContext, previous: &RuntimeConfig) {
    let saved = ctx.setup_store().read().await;
    let target = SetupConfig {
        secret_key: non_empty_or_previous(saved.secret_key.as_deref(), &previous.secret_key),
        database_url: non_empty_or_previous(saved.database_url.as_deref(), &previous.database_url),
        setup_completed: Some(saved.is_completed()),
    };
    if let Err(e) = ctx.apply_config(&target, true).await {
        error!(error = %e, "rollback to saved configuration failed");
    }
}

fn non_empty_or_previous(saved: Option<&str>, previous: &str) -> Option<String> {
    Some(non_empty_or(saved.unwrap_or_default(), previous).to_string())
}

fn as_setup_failure(e: NavError) -> NavError {
    match e {
        NavError::StorageInit(_) => e,
        other => NavError::StorageInit(other.to_string()),
    }
}

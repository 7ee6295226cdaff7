use crate::error::NavError;
use serde::Serialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// The saved setup document. Absent keys are `None`; an all-`None` document is "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_completed: Option<bool>,
}

impl SetupConfig {
    pub fn is_empty(&self) -> bool {
        self.secret_key.is_none() && self.database_url.is_none() && self.setup_completed.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.setup_completed.unwrap_or(false)
    }

    /// Lenient decode: non-object JSON yields an empty document, string fields must be
    /// strings (kept as written, empty included), and `setup_completed` follows JSON truthiness.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let string_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Self {
            secret_key: string_field("secret_key"),
            database_url: string_field("database_url"),
            setup_completed: obj.get("setup_completed").map(truthy),
        }
    }

    /// Fields set in `updates` replace ours; the rest are kept.
    pub fn merge(self, updates: SetupConfig) -> Self {
        Self {
            secret_key: updates.secret_key.or(self.secret_key),
            database_url: updates.database_url.or(self.database_url),
            setup_completed: updates.setup_completed.or(self.setup_completed),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// JSON file holding the setup document.
///
/// No locking: concurrent `update` calls may lose writes (last writer wins).
#[derive(Debug, Clone)]
pub struct SetupStore {
    path: PathBuf,
}

impl SetupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails; a missing or unreadable document is the empty document.
    pub async fn read(&self) -> SetupConfig {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %self.path.display(), error = %e, "setup file unreadable; treating as empty");
                }
                return SetupConfig::default();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => SetupConfig::from_value(&value),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "setup file malformed; treating as empty");
                SetupConfig::default()
            }
        }
    }

    /// Replace the whole document. Written to a sibling temp file, then renamed into place.
    pub async fn write(&self, doc: &SetupConfig) -> Result<(), NavError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn update(&self, updates: SetupConfig) -> Result<SetupConfig, NavError> {
        let merged = self.read().await.merge(updates);
        self.write(&merged).await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn store_in(dir: &tempfile::TempDir) -> SetupStore {
        SetupStore::new(dir.path().join("nested").join("setup.json"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);

        let doc = store.read().await;
        assert!(doc.is_empty());
        assert!(!doc.is_completed());
    }

    #[tokio::test]
    async fn malformed_contents_read_as_empty() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("setup.json");
        let store = SetupStore::new(&path);

        for contents in ["", "{", "not json", "[1, 2]", "42", "null", "\"text\"", "{\"secret_key\": 7}"] {
            std_fs::write(&path, contents).expect("failed to write fixture");
            assert!(store.read().await.is_empty(), "contents {contents:?} should read as empty");
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);
        let doc = SetupConfig {
            secret_key: Some("s3cr3t".into()),
            database_url: Some("sqlite:///tmp/nav.db?mode=rwc".into()),
            setup_completed: Some(true),
        };

        store.write(&doc).await.expect("write failed");
        assert_eq!(store.read().await, doc);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn empty_strings_survive_a_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);
        let doc = SetupConfig {
            secret_key: Some(String::new()),
            database_url: Some("sqlite://nav.db".into()),
            setup_completed: Some(true),
        };

        store.write(&doc).await.expect("write failed");
        assert_eq!(store.read().await, doc);
    }

    #[tokio::test]
    async fn write_overwrites_instead_of_merging() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);
        store
            .write(&SetupConfig {
                secret_key: Some("old".into()),
                ..Default::default()
            })
            .await
            .expect("write failed");

        let next = SetupConfig {
            database_url: Some("sqlite://next.db".into()),
            ..Default::default()
        };
        store.write(&next).await.expect("write failed");
        assert_eq!(store.read().await, next);
    }

    #[tokio::test]
    async fn update_on_empty_store_yields_only_the_update() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);

        store
            .update(SetupConfig {
                secret_key: Some("k".into()),
                ..Default::default()
            })
            .await
            .expect("update failed");

        let raw = std_fs::read_to_string(store.path()).expect("file missing");
        let value: Value = serde_json::from_str(&raw).expect("not json");
        assert_eq!(value, serde_json::json!({ "secret_key": "k" }));
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = store_in(&dir);
        store
            .write(&SetupConfig {
                secret_key: Some("k".into()),
                database_url: Some("sqlite://a.db".into()),
                setup_completed: Some(false),
            })
            .await
            .expect("write failed");

        let merged = store
            .update(SetupConfig {
                setup_completed: Some(true),
                ..Default::default()
            })
            .await
            .expect("update failed");
        assert_eq!(merged.secret_key.as_deref(), Some("k"));
        assert_eq!(merged.database_url.as_deref(), Some("sqlite://a.db"));
        assert!(store.read().await.is_completed());
    }

    #[test]
    fn completion_flag_uses_truthiness() {
        let read = |raw: &str| SetupConfig::from_value(&serde_json::from_str(raw).unwrap());

        assert!(read(r#"{"setup_completed": 1}"#).is_completed());
        assert!(read(r#"{"setup_completed": "yes"}"#).is_completed());
        assert!(!read(r#"{"setup_completed": 0}"#).is_completed());
        assert!(!read(r#"{"setup_completed": null}"#).is_completed());
        assert!(!read(r#"{"setup_completed": ""}"#).is_completed());
    }
}

use crate::db::models::{DbCategory, DbLink, DbUser, NewLink, SiteSettingEntry};
use crate::db::schema::{MYSQL_INIT, SQLITE_INIT};
use crate::error::NavError;
use chrono::{DateTime, Utc};
use sqlx::any::{AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::{Any, AnyConnection, Pool, Row};
use std::time::Duration;

pub type AnyPool = Pool<Any>;

/// Categories every fresh install starts with, as `(name, sort_order)`.
pub const DEFAULT_CATEGORIES: [(&str, i64); 3] = [("常用工具", 1), ("学习资源", 2), ("娱乐休闲", 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
}

impl Backend {
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.split_once(':')?;
        match scheme.to_ascii_lowercase().as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "mysql" | "mariadb" => Some(Backend::MySql),
            _ => None,
        }
    }

    fn init_script(self) -> &'static str {
        match self {
            Backend::Sqlite => SQLITE_INIT,
            Backend::MySql => MYSQL_INIT,
        }
    }
}

/// Live handle on the navigation database: a pool bound to one URL.
#[derive(Debug, Clone)]
pub struct NavStorage {
    pool: AnyPool,
    backend: Backend,
    url: String,
}

impl NavStorage {
    /// Build a pool without connecting; the first query opens the connection.
    pub fn connect_lazy(url: &str) -> Result<Self, NavError> {
        let backend = Backend::from_url(url).ok_or_else(|| {
            let scheme = url.split_once(':').map_or(url, |(s, _)| s);
            NavError::StorageInit(format!("unsupported database url scheme: {scheme:?}"))
        })?;
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(url)
            .map_err(|e| NavError::StorageInit(e.to_string()))?;
        Ok(Self {
            pool,
            backend,
            url: url.to_string(),
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), NavError> {
        for stmt in self.backend.init_script().split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert any missing default category. Returns how many were created.
    pub async fn ensure_default_categories(&self) -> Result<usize, NavError> {
        let mut tx = self.pool.begin().await?;
        let created = ensure_categories(&mut tx, &DEFAULT_CATEGORIES).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Default categories plus the admin account, in a single transaction.
    pub async fn bootstrap_admin(&self, username: &str, password_hash: &str) -> Result<i64, NavError> {
        let mut tx = self.pool.begin().await?;
        ensure_categories(&mut tx, &DEFAULT_CATEGORIES).await?;
        let id = upsert_user(&mut tx, self.backend, username, password_hash).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Create the user, or overwrite the password hash of an existing one. Returns the row id.
    pub async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<i64, NavError> {
        let mut conn = self.pool.acquire().await?;
        upsert_user(&mut conn, self.backend, username, password_hash).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<DbUser>, NavError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<DbUser>, NavError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, password_hash FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list_categories(&self) -> Result<Vec<DbCategory>, NavError> {
        let rows = sqlx::query_as::<_, DbCategory>(
            "SELECT id, name, sort_order FROM categories ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add_category(&self, name: &str, sort_order: i64) -> Result<i64, NavError> {
        let mut conn = self.pool.acquire().await?;
        let res = sqlx::query("INSERT INTO categories (name, sort_order) VALUES (?, ?)")
            .bind(name)
            .bind(sort_order)
            .execute(&mut *conn)
            .await?;
        inserted_id(&mut conn, self.backend, &res).await
    }

    /// Delete a category together with its links. Returns false if it did not exist.
    pub async fn delete_category(&self, id: i64) -> Result<bool, NavError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM links WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn list_links(&self) -> Result<Vec<DbLink>, NavError> {
        let rows = sqlx::query(
            r#"SELECT id, title, url, description, icon, category_id, created_at, clicks
               FROM links ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_link).collect()
    }

    pub async fn count_links(&self) -> Result<i64, NavError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM links")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn add_link(&self, link: NewLink) -> Result<i64, NavError> {
        let created_at = Utc::now().to_rfc3339();
        let mut conn = self.pool.acquire().await?;
        let res = sqlx::query(
            r#"INSERT INTO links (title, url, description, icon, category_id, created_at, clicks)
               VALUES (?, ?, ?, ?, ?, ?, 0)"#,
        )
        .bind(link.title)
        .bind(link.url)
        .bind(link.description)
        .bind(link.icon)
        .bind(link.category_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        inserted_id(&mut conn, self.backend, &res).await
    }

    pub async fn delete_link(&self, id: i64) -> Result<bool, NavError> {
        let res = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Bump the click counter and return the link's target URL, or `None` if unknown.
    pub async fn record_click(&self, id: i64) -> Result<Option<String>, NavError> {
        let res = sqlx::query("UPDATE links SET clicks = clicks + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        let rec: (String,) = sqlx::query_as("SELECT url FROM links WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Some(rec.0))
    }

    pub async fn site_settings(&self) -> Result<Vec<SiteSettingEntry>, NavError> {
        let rows = sqlx::query_as::<_, SiteSettingEntry>(
            "SELECT setting_key, setting_value FROM site_config",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Write several settings in one transaction, inserting rows that do not exist yet.
    pub async fn upsert_site_settings(&self, entries: &[(&str, &str)]) -> Result<(), NavError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            let res = sqlx::query("UPDATE site_config SET setting_value = ? WHERE setting_key = ?")
                .bind(*value)
                .bind(*key)
                .execute(&mut *tx)
                .await?;
            if res.rows_affected() == 0 {
                sqlx::query("INSERT INTO site_config (setting_key, setting_value) VALUES (?, ?)")
                    .bind(*key)
                    .bind(*value)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    fn row_to_link(row: AnyRow) -> Result<DbLink, NavError> {
        let created_at_str: String = row.try_get("created_at")?;
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DbLink {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            url: row.try_get("url")?,
            description: row.try_get("description")?,
            icon: row.try_get("icon")?,
            category_id: row.try_get("category_id")?,
            created_at,
            clicks: row.try_get("clicks")?,
        })
    }
}

async fn ensure_categories(
    conn: &mut AnyConnection,
    categories: &[(&str, i64)],
) -> Result<usize, NavError> {
    let mut created = 0;
    for (name, sort_order) in categories {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE name = ?")
            .bind(*name)
            .fetch_optional(&mut *conn)
            .await?;
        if existing.is_some() {
            continue;
        }
        sqlx::query("INSERT INTO categories (name, sort_order) VALUES (?, ?)")
            .bind(*name)
            .bind(*sort_order)
            .execute(&mut *conn)
            .await?;
        created += 1;
    }
    Ok(created)
}

async fn upsert_user(
    conn: &mut AnyConnection,
    backend: Backend,
    username: &str,
    password_hash: &str,
) -> Result<i64, NavError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some((id,)) = existing {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        return Ok(id);
    }

    let res = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
        .bind(username)
        .bind(password_hash)
        .execute(&mut *conn)
        .await?;
    inserted_id(conn, backend, &res).await
}

/// Row id of the insert that produced `res`. The `Any` driver only reports it
/// for MySQL; SQLite is asked on the same connection.
async fn inserted_id(
    conn: &mut AnyConnection,
    backend: Backend,
    res: &AnyQueryResult,
) -> Result<i64, NavError> {
    if let Some(id) = res.last_insert_id() {
        return Ok(id);
    }
    match backend {
        Backend::Sqlite => {
            let (id,): (i64,) = sqlx::query_as("SELECT last_insert_rowid()")
                .fetch_one(&mut *conn)
                .await?;
            Ok(id)
        }
        Backend::MySql => Err(NavError::DatabaseError(sqlx::Error::RowNotFound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh_storage(dir: &tempfile::TempDir) -> NavStorage {
        let url = crate::config::sqlite_url(&dir.path().join("nav.db"));
        let storage = NavStorage::connect_lazy(&url).expect("pool");
        storage.init_schema().await.expect("schema");
        storage
    }

    #[test]
    fn backend_is_picked_from_scheme() {
        assert_eq!(Backend::from_url("sqlite://a.db"), Some(Backend::Sqlite));
        assert_eq!(Backend::from_url("sqlite::memory:"), Some(Backend::Sqlite));
        assert_eq!(Backend::from_url("mysql://u:p@h/db"), Some(Backend::MySql));
        assert_eq!(Backend::from_url("MariaDB://h/db"), Some(Backend::MySql));
        assert_eq!(Backend::from_url("postgres://h/db"), None);
        assert_eq!(Backend::from_url("no-scheme"), None);
    }

    #[test]
    fn unsupported_scheme_is_a_storage_init_error() {
        let err = NavStorage::connect_lazy("redis://localhost").expect_err("should fail");
        assert!(matches!(err, NavError::StorageInit(_)));
    }

    #[tokio::test]
    async fn init_schema_is_repeatable() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;
        storage.init_schema().await.expect("second init");
    }

    #[tokio::test]
    async fn default_categories_are_not_duplicated() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;

        assert_eq!(storage.ensure_default_categories().await.unwrap(), 3);
        assert_eq!(storage.ensure_default_categories().await.unwrap(), 0);

        let names: Vec<String> = storage
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["常用工具", "学习资源", "娱乐休闲"]);
    }

    #[tokio::test]
    async fn upsert_user_overwrites_existing_hash() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;

        let first = storage.upsert_user("admin", "hash-1").await.unwrap();
        let second = storage.upsert_user("admin", "hash-2").await.unwrap();
        assert_eq!(first, second);

        let user = storage.find_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "hash-2");
        assert_eq!(storage.find_user_by_id(first).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn clicks_increment_and_unknown_links_miss() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;
        let category_id = storage.add_category("Tools", 0).await.unwrap();
        let link_id = storage
            .add_link(NewLink {
                title: "GitHub".into(),
                url: "https://github.com".into(),
                description: None,
                icon: "fab fa-github".into(),
                category_id,
            })
            .await
            .unwrap();

        for _ in 0..3 {
            let url = storage.record_click(link_id).await.unwrap();
            assert_eq!(url.as_deref(), Some("https://github.com"));
        }
        assert_eq!(storage.record_click(link_id + 100).await.unwrap(), None);

        let links = storage.list_links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].clicks, 3);
        assert_eq!(links[0].description, None);
    }

    #[tokio::test]
    async fn deleting_a_category_removes_its_links() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;
        let keep = storage.add_category("Keep", 1).await.unwrap();
        let gone = storage.add_category("Drop", 2).await.unwrap();
        for (title, category_id) in [("a", keep), ("b", gone), ("c", gone)] {
            storage
                .add_link(NewLink {
                    title: title.into(),
                    url: format!("https://{title}.example"),
                    description: Some("desc".into()),
                    icon: "fas fa-globe".into(),
                    category_id,
                })
                .await
                .unwrap();
        }

        assert!(storage.delete_category(gone).await.unwrap());
        assert!(!storage.delete_category(gone).await.unwrap());
        assert_eq!(storage.count_links().await.unwrap(), 1);
        assert_eq!(storage.list_links().await.unwrap()[0].category_id, keep);
    }

    #[tokio::test]
    async fn inserts_report_their_row_ids() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;

        let first = storage.add_category("One", 0).await.unwrap();
        let second = storage.add_category("Two", 0).await.unwrap();
        assert!(second > first);

        let admin = storage.bootstrap_admin("admin", "hash").await.unwrap();
        assert_eq!(storage.find_user_by_id(admin).await.unwrap().unwrap().username, "admin");
        assert_eq!(storage.bootstrap_admin("admin", "hash-2").await.unwrap(), admin);
    }

    #[tokio::test]
    async fn site_settings_upsert_inserts_then_updates() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = fresh_storage(&dir).await;

        storage
            .upsert_site_settings(&[("site_title", "One")])
            .await
            .unwrap();
        storage
            .upsert_site_settings(&[("site_title", "Two"), ("site_brand", "Brand")])
            .await
            .unwrap();

        let mut rows = storage.site_settings().await.unwrap();
        rows.sort_by(|a, b| a.setting_key.cmp(&b.setting_key));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].setting_key, "site_brand");
        assert_eq!(rows[1].setting_value.as_deref(), Some("Two"));
    }
}

//! SQL DDL for initializing the navigation store.
//! One script per backend; statements are split on `;` and run in order.

/// SQLite schema:
/// - `users.username` UNIQUE
/// - `site_config` keyed by the setting name
/// - `links.category_id` references `categories(id)` with cascading delete
/// - `created_at` TEXT (RFC3339)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS site_config (
    setting_key TEXT PRIMARY KEY,
    setting_value TEXT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NULL,
    icon TEXT NOT NULL DEFAULT 'fas fa-globe',
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL, -- RFC3339
    clicks INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_links_category_id ON links(category_id)
"#;

/// MySQL / MariaDB schema, same shape as [`SQLITE_INIT`].
/// Integer columns are BIGINT so they decode as i64 through the `Any` driver.
pub const MYSQL_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    username VARCHAR(64) NOT NULL UNIQUE,
    password_hash VARCHAR(256) NOT NULL
);

CREATE TABLE IF NOT EXISTS site_config (
    setting_key VARCHAR(50) NOT NULL PRIMARY KEY,
    setting_value VARCHAR(256) NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(64) NOT NULL,
    sort_order BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS links (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    title VARCHAR(128) NOT NULL,
    url VARCHAR(256) NOT NULL,
    description VARCHAR(256) NULL,
    icon VARCHAR(64) NOT NULL DEFAULT 'fas fa-globe',
    category_id BIGINT NOT NULL,
    created_at VARCHAR(40) NOT NULL,
    clicks BIGINT NOT NULL DEFAULT 0,
    INDEX idx_links_category_id (category_id),
    CONSTRAINT fk_links_category FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
)
"#;

//! Database module: models, schema and the swappable storage handle.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL per backend (SQLite, MySQL)
//! - `storage.rs`: queries against one pool
//! - `manager.rs`: owns the active pool and replaces it on URL change

pub mod manager;
pub mod models;
pub mod schema;
pub mod storage;

pub use manager::StorageManager;
pub use models::{DbCategory, DbLink, DbUser, NewLink, SiteSettingEntry};
pub use storage::{Backend, DEFAULT_CATEGORIES, NavStorage};

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod service;
pub mod router;
pub mod middleware;
pub mod db;
pub mod setup;
pub mod templates;

pub use context::AppContext;
pub use error::NavError;

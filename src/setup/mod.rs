//! First-run setup: the saved setup document and the wizard that produces it.

pub mod init_db;
pub mod store;
pub mod wizard;

pub use init_db::{InitReport, init_db};
pub use store::{SetupConfig, SetupStore};
pub use wizard::{SetupForm, run_setup};

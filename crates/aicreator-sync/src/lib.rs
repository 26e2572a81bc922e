//! Local-first synchronization layer.
//!
//! Repositories call the remote service and, on success, mirror the result
//! into the local store. Reads always come from the local store through
//! [`LiveQuery`] subscriptions that re-run after each relevant write.

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod repo;
pub mod session;
pub mod tasks;
pub mod validation;
pub mod view;

use std::sync::Arc;

use aicreator_db::Database;

pub use app::App;
pub use config::Config;
pub use error::SyncError;
pub use feed::{ChangeFeed, LiveQuery};
pub use session::Session;
pub use tasks::{TaskHandle, TaskPool};

/// Run blocking store work off the async runtime.
pub(crate) async fn run_blocking<T, F>(db: &Arc<Database>, f: F) -> Result<T, SyncError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
{
    let db = db.clone();
    Ok(tokio::task::spawn_blocking(move || f(&db)).await??)
}

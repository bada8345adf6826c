//! CLI command implementations.
//!
//! The commands are a thin presentation shim: they parse user intents,
//! build the backend from config plus the cached session, drive the
//! stores, and print the resulting state. No list/item semantics live
//! here.

mod auth;
mod item_cmd;
mod list_cmd;

pub use auth::AuthCommand;
pub use item_cmd::{ItemCommand, StatsCommand};
pub use list_cmd::ListCommand;

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use feira::backend::{Backend, HttpBackend};
use feira::config::Config;
use feira::notify::Notifier;
use feira::session::Session;
use feira::stores::ListStore;

/// Reads the cached session, if any. A missing or unreadable file is
/// simply "not signed in".
pub(crate) fn load_session(path: &Path) -> Option<Session> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&contents).ok()
}

/// Caches the session for later invocations.
pub(crate) fn save_session(path: &Path, session: &Session) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(session)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, yaml)
}

/// Removes the cached session. Already-absent is fine.
pub(crate) fn clear_session(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Builds the data-service client, authorized as the session's user when
/// one is cached.
pub(crate) fn build_backend(config: &Config, session: Option<&Session>) -> Arc<dyn Backend> {
    let mut backend = HttpBackend::new(config.server_url.clone(), config.anon_key.clone());
    if let Some(session) = session {
        backend = backend.with_access_token(session.access_token.clone());
    }
    Arc::new(backend)
}

/// Picks the list to operate on: an explicit `--list` id wins, otherwise
/// the List Store's default selection (first of owned-then-shared).
pub(crate) async fn resolve_list_id(
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    session: Option<&Session>,
    explicit: Option<Uuid>,
) -> Result<Option<Uuid>, Box<dyn std::error::Error>> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    let mut lists = ListStore::new(backend, notifier);
    lists.load_lists(session).await?;
    Ok(lists.current_list_id())
}

//! Feira
//!
//! A shared shopping-list client core. Persistence, authentication, and
//! sharing permissions live in an external managed data service; this
//! crate holds the synchronization logic that reconciles locally-held
//! state with that service, plus derived spend statistics.

pub mod backend;
pub mod config;
pub mod models;
pub mod notify;
pub mod session;
pub mod stores;

pub use backend::{Backend, BackendError, HttpBackend, MemoryBackend};
pub use models::{
    compute_stats, ShareGrant, ShoppingItem, ShoppingList, ShoppingListStats, Unit,
};
pub use notify::{LogNotifier, Notice, Notifier, Severity};
pub use session::{AuthUser, Session, SessionClient, SessionError};
pub use stores::{ItemPatch, ItemStore, ItemStoreError, ListStore, ListStoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

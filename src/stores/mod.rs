//! Local stores that reconcile UI-held state with the remote service.
//!
//! Both stores follow the same mutation discipline: issue the remote call
//! first; on success apply the equivalent local mutation; on failure leave
//! local state untouched, emit one user notice, and return the error. No
//! optimistic updates, no rollback, no retry.
//!
//! Loads are split-phase. `begin_load` stamps a generation token and
//! `finish_load` discards any completion whose token is no longer current,
//! so a stale in-flight load (the selected list changed while a previous
//! fetch was pending) can never overwrite state for the wrong scope.

pub mod item_store;
pub mod list_store;

pub use item_store::{ItemPatch, ItemStore, ItemStoreError};
pub use list_store::{ListStore, ListStoreError};

/// Generation token stamped on a load when it starts.
///
/// A completing load is applied only if its token still matches the
/// store's current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(pub(crate) u64);

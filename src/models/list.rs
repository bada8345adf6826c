//! Shopping lists and share grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, owned collection of items, optionally shared with other users.
///
/// A list has exactly one owner and zero or more grantees; ownership never
/// transfers. `shared` is a viewer-relative derivation: true when the
/// current viewer is not the owner but holds a grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// True when the current viewer accesses this list through a grant.
    pub shared: bool,
    /// Owner id, populated only on shared lists.
    pub shared_by: Option<Uuid>,
}

/// A record authorizing a non-owner user to view and use a list.
///
/// At most one active grant exists per (list, grantee) pair; the storage
/// layer enforces this with a composite uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub id: Uuid,
    pub list_id: Uuid,
    pub grantee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

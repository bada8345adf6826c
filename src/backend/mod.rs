//! Boundary to the managed data service.
//!
//! The service owns persistence, row-level authorization, and cascade
//! behavior. This module defines the tabular interface the stores consume
//! (three logical tables: lists, items, share grants, plus a profile lookup
//! for share-target resolution) and the row shapes that cross the wire.

pub mod error;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ShareGrant, ShoppingItem, ShoppingList, Unit};

pub use error::BackendError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// A shopping list row as stored by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Owner id.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ListRow {
    /// Converts to the domain model, tagging the viewer-relative share
    /// derivation.
    pub fn into_list(self, shared: bool) -> ShoppingList {
        ShoppingList {
            id: self.id,
            name: self.name,
            description: self.description,
            owner_id: self.user_id,
            created_at: self.created_at,
            shared,
            shared_by: shared.then_some(self.user_id),
        }
    }
}

/// An item row as stored by the service.
///
/// Numeric and unit fields are optional: rows created before a column
/// existed come back null. Conversion normalizes them to defaults
/// (quantity 1, price 0, count-based unit). This is a compatibility shim,
/// not a business rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub price: Option<f64>,
    pub completed: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ItemRow {
    /// Converts to the domain model, applying normalization defaults.
    pub fn into_item(self) -> ShoppingItem {
        ShoppingItem {
            id: self.id,
            name: self.name,
            quantity: self.quantity.unwrap_or(1.0),
            unit: self.unit.unwrap_or_default(),
            price: self.price.unwrap_or(0.0),
            completed: self.completed.unwrap_or(false),
            created_at: self.created_at.unwrap_or_else(Utc::now),
            completed_at: self.completed_at,
        }
    }
}

/// A share grant row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRow {
    pub id: Uuid,
    pub list_id: Uuid,
    /// Grantee id.
    pub shared_with: Uuid,
    pub created_at: DateTime<Utc>,
}

impl GrantRow {
    pub fn into_grant(self) -> ShareGrant {
        ShareGrant {
            id: self.id,
            list_id: self.list_id,
            grantee_id: self.shared_with,
            created_at: self.created_at,
        }
    }
}

/// A user profile, looked up when resolving a share target.
///
/// `email` is the dedicated unique lookup field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Payload for inserting a new list.
#[derive(Debug, Clone, Serialize)]
pub struct NewList {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Payload for inserting a new item.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub user_id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub price: f64,
    pub completed: bool,
}

/// Partial update for an item. Absent fields are left untouched.
///
/// `completed_at` is doubly optional: the outer level means "change it",
/// the inner level is the new value (None writes null).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

/// The tabular data interface the stores consume.
///
/// Implementations: [`HttpBackend`] against the hosted service and
/// [`MemoryBackend`] for tests and offline experimentation. Both enforce
/// the same contract, including the composite uniqueness constraint on
/// (list, grantee) grants.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Lists owned by `owner`, newest first.
    async fn owned_lists(&self, owner: Uuid) -> Result<Vec<ListRow>, BackendError>;

    /// Lists shared with `grantee` through the grant relation, newest first.
    async fn shared_lists(&self, grantee: Uuid) -> Result<Vec<ListRow>, BackendError>;

    /// Inserts a list, returning the server-confirmed row.
    async fn insert_list(&self, new: NewList) -> Result<ListRow, BackendError>;

    /// Deletes a list scoped to its owner. Returns false when nothing
    /// matched (unknown id or not the owner).
    async fn delete_list(&self, id: Uuid, owner: Uuid) -> Result<bool, BackendError>;

    /// Resolves a share target by its unique email.
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, BackendError>;

    /// Creates a share grant. Fails with [`BackendError::Conflict`] when a
    /// grant for the same (list, grantee) pair already exists.
    async fn insert_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<GrantRow, BackendError>;

    /// Removes a share grant.
    async fn delete_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<(), BackendError>;

    /// All items of a list, newest first.
    async fn items(&self, list_id: Uuid) -> Result<Vec<ItemRow>, BackendError>;

    /// Inserts an item, returning the server-confirmed row.
    async fn insert_item(&self, new: NewItem) -> Result<ItemRow, BackendError>;

    /// Applies a partial update, scoped by item id only.
    async fn update_item(&self, id: Uuid, changes: ItemChanges) -> Result<(), BackendError>;

    /// Deletes one item by id.
    async fn delete_item(&self, id: Uuid) -> Result<(), BackendError>;

    /// Deletes a batch of items by id.
    async fn delete_items(&self, ids: &[Uuid]) -> Result<(), BackendError>;

    /// Deletes every item of a list.
    async fn delete_list_items(&self, list_id: Uuid) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_row_normalization_defaults() {
        let row = ItemRow {
            id: Uuid::new_v4(),
            list_id: Uuid::new_v4(),
            name: "Legacy".to_string(),
            quantity: None,
            unit: None,
            price: None,
            completed: None,
            created_at: None,
            completed_at: None,
        };

        let item = row.into_item();
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.unit, Unit::Unit);
        assert_eq!(item.price, 0.0);
        assert!(!item.completed);
        assert!(item.completed_at.is_none());
    }

    #[test]
    fn test_list_row_share_tagging() {
        let owner = Uuid::new_v4();
        let row = ListRow {
            id: Uuid::new_v4(),
            name: "Groceries".to_string(),
            description: None,
            user_id: owner,
            created_at: Utc::now(),
        };

        let own = row.clone().into_list(false);
        assert!(!own.shared);
        assert!(own.shared_by.is_none());

        let shared = row.into_list(true);
        assert!(shared.shared);
        assert_eq!(shared.shared_by, Some(owner));
    }

    #[test]
    fn test_item_changes_serializes_null_completed_at() {
        let changes = ItemChanges {
            completed: Some(false),
            completed_at: Some(None),
            ..Default::default()
        };

        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["completed"], serde_json::json!(false));
        assert!(json["completed_at"].is_null());
        // Untouched fields must not appear in the payload at all.
        assert!(json.get("name").is_none());
        assert!(json.get("quantity").is_none());
    }
}

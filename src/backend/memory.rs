//! In-process backend with the same contract as the hosted service.
//!
//! Used by the test suite and for offline experimentation. It emulates the
//! service-side behavior the stores rely on: owner-scoped list deletes,
//! cascade of items and grants when a list goes away, and the composite
//! uniqueness constraint on (list, grantee) grants.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    Backend, BackendError, GrantRow, ItemChanges, ItemRow, ListRow, NewItem, NewList, Profile,
};

#[derive(Debug, Default)]
struct State {
    profiles: Vec<Profile>,
    /// Insertion order; reads reverse it for newest-first.
    lists: Vec<ListRow>,
    items: Vec<ItemRow>,
    grants: Vec<GrantRow>,
    /// When set, every call fails with a transport error.
    failing: bool,
}

/// In-memory [`Backend`] implementation.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("backend state lock poisoned")
    }

    /// Registers a profile and returns its id. Emails are unique.
    pub fn add_profile(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state().profiles.push(Profile {
            id,
            email: email.to_string(),
            display_name: None,
        });
        id
    }

    /// Makes every subsequent call fail with a transport error, or restores
    /// normal operation. Lets tests exercise the no-partial-mutation policy.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Current grants, for asserting on share effects.
    pub fn grants(&self) -> Vec<GrantRow> {
        self.state().grants.clone()
    }

    /// Raw item rows of a list, in insertion order.
    pub fn raw_items(&self, list_id: Uuid) -> Vec<ItemRow> {
        self.state()
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect()
    }

    fn guard(state: &State) -> Result<(), BackendError> {
        if state.failing {
            Err(BackendError::Http("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn owned_lists(&self, owner: Uuid) -> Result<Vec<ListRow>, BackendError> {
        let state = self.state();
        Self::guard(&state)?;
        Ok(state
            .lists
            .iter()
            .rev()
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect())
    }

    async fn shared_lists(&self, grantee: Uuid) -> Result<Vec<ListRow>, BackendError> {
        let state = self.state();
        Self::guard(&state)?;
        let granted: Vec<Uuid> = state
            .grants
            .iter()
            .filter(|g| g.shared_with == grantee)
            .map(|g| g.list_id)
            .collect();
        Ok(state
            .lists
            .iter()
            .rev()
            .filter(|l| granted.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn insert_list(&self, new: NewList) -> Result<ListRow, BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        let row = ListRow {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            user_id: new.user_id,
            created_at: Utc::now(),
        };
        state.lists.push(row.clone());
        Ok(row)
    }

    async fn delete_list(&self, id: Uuid, owner: Uuid) -> Result<bool, BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        let before = state.lists.len();
        state.lists.retain(|l| !(l.id == id && l.user_id == owner));
        if state.lists.len() == before {
            return Ok(false);
        }
        // Cascade, as the hosted service does.
        state.items.retain(|i| i.list_id != id);
        state.grants.retain(|g| g.list_id != id);
        Ok(true)
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, BackendError> {
        let state = self.state();
        Self::guard(&state)?;
        Ok(state.profiles.iter().find(|p| p.email == email).cloned())
    }

    async fn insert_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<GrantRow, BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        let exists = state
            .grants
            .iter()
            .any(|g| g.list_id == list_id && g.shared_with == grantee);
        if exists {
            return Err(BackendError::Conflict);
        }
        let row = GrantRow {
            id: Uuid::new_v4(),
            list_id,
            shared_with: grantee,
            created_at: Utc::now(),
        };
        state.grants.push(row.clone());
        Ok(row)
    }

    async fn delete_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        state
            .grants
            .retain(|g| !(g.list_id == list_id && g.shared_with == grantee));
        Ok(())
    }

    async fn items(&self, list_id: Uuid) -> Result<Vec<ItemRow>, BackendError> {
        let state = self.state();
        Self::guard(&state)?;
        Ok(state
            .items
            .iter()
            .rev()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, new: NewItem) -> Result<ItemRow, BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        let row = ItemRow {
            id: Uuid::new_v4(),
            list_id: new.list_id,
            name: new.name,
            quantity: Some(new.quantity),
            unit: Some(new.unit),
            price: Some(new.price),
            completed: Some(new.completed),
            created_at: Some(Utc::now()),
            completed_at: None,
        };
        state.items.push(row.clone());
        Ok(row)
    }

    async fn update_item(&self, id: Uuid, changes: ItemChanges) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        if let Some(row) = state.items.iter_mut().find(|i| i.id == id) {
            if let Some(name) = changes.name {
                row.name = name;
            }
            if let Some(quantity) = changes.quantity {
                row.quantity = Some(quantity);
            }
            if let Some(unit) = changes.unit {
                row.unit = Some(unit);
            }
            if let Some(price) = changes.price {
                row.price = Some(price);
            }
            if let Some(completed) = changes.completed {
                row.completed = Some(completed);
            }
            if let Some(completed_at) = changes.completed_at {
                row.completed_at = completed_at;
            }
        }
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        state.items.retain(|i| i.id != id);
        Ok(())
    }

    async fn delete_items(&self, ids: &[Uuid]) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        state.items.retain(|i| !ids.contains(&i.id));
        Ok(())
    }

    async fn delete_list_items(&self, list_id: Uuid) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::guard(&state)?;
        state.items.retain(|i| i.list_id != list_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_list(owner: Uuid, name: &str) -> NewList {
        NewList {
            user_id: owner,
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_owned_lists_newest_first() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();

        backend.insert_list(new_list(owner, "First")).await.unwrap();
        backend.insert_list(new_list(owner, "Second")).await.unwrap();

        let lists = backend.owned_lists(owner).await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].name, "Second");
        assert_eq!(lists[1].name, "First");
    }

    #[tokio::test]
    async fn test_delete_list_scoped_to_owner() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let list = backend.insert_list(new_list(owner, "Mine")).await.unwrap();

        assert!(!backend.delete_list(list.id, stranger).await.unwrap());
        assert_eq!(backend.owned_lists(owner).await.unwrap().len(), 1);

        assert!(backend.delete_list(list.id, owner).await.unwrap());
        assert!(backend.owned_lists(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_list_cascades() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let grantee = Uuid::new_v4();

        let list = backend.insert_list(new_list(owner, "Mine")).await.unwrap();
        backend
            .insert_item(NewItem {
                user_id: owner,
                list_id: list.id,
                name: "Milk".to_string(),
                quantity: 1.0,
                unit: crate::models::Unit::Unit,
                price: 4.5,
                completed: false,
            })
            .await
            .unwrap();
        backend.insert_grant(list.id, grantee).await.unwrap();

        backend.delete_list(list.id, owner).await.unwrap();

        assert!(backend.items(list.id).await.unwrap().is_empty());
        assert!(backend.grants().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_grant_conflicts() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let grantee = Uuid::new_v4();
        let list = backend.insert_list(new_list(owner, "Mine")).await.unwrap();

        backend.insert_grant(list.id, grantee).await.unwrap();
        let err = backend.insert_grant(list.id, grantee).await.unwrap_err();
        assert!(matches!(err, BackendError::Conflict));
        assert_eq!(backend.grants().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();

        backend.set_failing(true);
        assert!(backend.owned_lists(owner).await.is_err());

        backend.set_failing(false);
        assert!(backend.owned_lists(owner).await.is_ok());
    }
}

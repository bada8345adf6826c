//! Item Store: CRUD over the items of the currently selected list, plus
//! derived statistics.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::backend::{Backend, BackendError, ItemChanges, NewItem};
use crate::models::{compute_stats, ShoppingItem, ShoppingListStats, Unit};
use crate::notify::{Notice, Notifier};
use crate::session::Session;

use super::LoadToken;

/// Errors from Item Store operations.
#[derive(Debug)]
pub enum ItemStoreError {
    /// Operation attempted with no session; rejected before any remote call.
    NotAuthenticated,
    /// Operation needs a selected list and none was given.
    NoListSelected,
    /// The item is not in the loaded set.
    UnknownItem,
    /// Item name empty after trimming.
    InvalidName,
    /// Quantity not positive, or fractional for a count-based unit.
    InvalidQuantity,
    /// Price negative or not finite.
    InvalidPrice,
    /// Remote call failed.
    Backend(BackendError),
}

impl std::fmt::Display for ItemStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStoreError::NotAuthenticated => write!(f, "Not signed in"),
            ItemStoreError::NoListSelected => write!(f, "No list selected"),
            ItemStoreError::UnknownItem => write!(f, "Item not found"),
            ItemStoreError::InvalidName => write!(f, "Item name cannot be empty"),
            ItemStoreError::InvalidQuantity => {
                write!(
                    f,
                    "Quantity must be positive, and whole for count-based units"
                )
            }
            ItemStoreError::InvalidPrice => write!(f, "Price must be zero or positive"),
            ItemStoreError::Backend(e) => write!(f, "Backend error: {}", e),
        }
    }
}

impl std::error::Error for ItemStoreError {}

impl From<BackendError> for ItemStoreError {
    fn from(e: BackendError) -> Self {
        ItemStoreError::Backend(e)
    }
}

/// Partial edit of an item's user-editable fields.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub price: Option<f64>,
}

/// Holds the item set of exactly one list.
///
/// Same mutation discipline as the List Store: remote call first, local
/// mutation only on success, one notice per failure, no retry.
pub struct ItemStore {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    items: Vec<ShoppingItem>,
    generation: u64,
    loading: bool,
}

impl ItemStore {
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            items: Vec::new(),
            generation: 0,
            loading: true,
        }
    }

    /// The loaded items, newest first.
    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Derived statistics over the in-memory item set. Pure recomputation;
    /// no remote call.
    pub fn stats(&self) -> ShoppingListStats {
        compute_stats(&self.items)
    }

    /// Starts a load, invalidating any load still in flight.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        self.loading = true;
        LoadToken(self.generation)
    }

    /// Applies a completed load. Returns false (discarding the result) when
    /// a newer load has started since `token` was issued.
    pub fn finish_load(&mut self, token: LoadToken, items: Vec<ShoppingItem>) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.items = items;
        self.loading = false;
        true
    }

    fn abort_load(&mut self, token: LoadToken) {
        if token.0 == self.generation {
            self.loading = false;
        }
    }

    /// Loads the items of `list_id`, newest first.
    ///
    /// A missing session or list id clears the set and finishes
    /// immediately: an empty state, not an error.
    pub async fn load_items(
        &mut self,
        session: Option<&Session>,
        list_id: Option<Uuid>,
    ) -> Result<(), ItemStoreError> {
        let token = self.begin_load();

        let (Some(_session), Some(list_id)) = (session, list_id) else {
            self.finish_load(token, Vec::new());
            return Ok(());
        };

        let rows = match self.backend.items(list_id).await {
            Ok(rows) => rows,
            Err(e) => {
                self.abort_load(token);
                self.notifier.notify(Notice::error(
                    "Could not load list",
                    "The list's items could not be loaded.",
                ));
                return Err(e.into());
            }
        };

        let items = rows.into_iter().map(|r| r.into_item()).collect();
        self.finish_load(token, items);
        Ok(())
    }

    /// Adds an item to `list_id` with `completed = false` and prepends the
    /// server-confirmed row (server-assigned id and timestamp).
    pub async fn add_item(
        &mut self,
        session: Option<&Session>,
        list_id: Option<Uuid>,
        name: &str,
        quantity: f64,
        unit: Unit,
        price: f64,
    ) -> Result<Uuid, ItemStoreError> {
        let Some(session) = session else {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to add items.",
            ));
            return Err(ItemStoreError::NotAuthenticated);
        };
        let Some(list_id) = list_id else {
            self.notifier.notify(Notice::error(
                "No list selected",
                "Select a list before adding items.",
            ));
            return Err(ItemStoreError::NoListSelected);
        };

        let name = name.trim();
        if name.is_empty() {
            self.notifier.notify(Notice::error(
                "Invalid item",
                "The item name cannot be empty.",
            ));
            return Err(ItemStoreError::InvalidName);
        }
        if let Err(e) = validate_quantity(quantity, unit) {
            self.notifier.notify(Notice::error(
                "Invalid quantity",
                "Quantity must be positive, and whole for count-based units.",
            ));
            return Err(e);
        }
        if let Err(e) = validate_price(price) {
            self.notifier.notify(Notice::error(
                "Invalid price",
                "Price must be zero or positive.",
            ));
            return Err(e);
        }

        let new = NewItem {
            user_id: session.user.id,
            list_id,
            name: name.to_string(),
            quantity,
            unit,
            price,
            completed: false,
        };

        let row = match self.backend.insert_item(new).await {
            Ok(row) => row,
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Could not add item",
                    "The item could not be added.",
                ));
                return Err(e.into());
            }
        };

        let item = row.into_item();
        let id = item.id;
        self.items.insert(0, item);

        self.notifier.notify(Notice::info(
            "Item added",
            format!("{} was added to the list.", name),
        ));
        Ok(id)
    }

    /// Flips an item's completion. `completed_at` is stamped with "now" on
    /// the transition to completed and cleared on the way back. The remote
    /// update is scoped by item id only. Returns the new completion state.
    pub async fn toggle_item(&mut self, id: Uuid) -> Result<bool, ItemStoreError> {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            self.notifier
                .notify(Notice::error("Item not found", "The item no longer exists."));
            return Err(ItemStoreError::UnknownItem);
        };

        let completed = !self.items[index].completed;
        let completed_at = completed.then(Utc::now);

        let changes = ItemChanges {
            completed: Some(completed),
            completed_at: Some(completed_at),
            ..Default::default()
        };

        if let Err(e) = self.backend.update_item(id, changes).await {
            self.notifier.notify(Notice::error(
                "Could not update item",
                "The item could not be updated.",
            ));
            return Err(e.into());
        }

        let item = &mut self.items[index];
        item.completed = completed;
        item.completed_at = completed_at;

        if completed {
            self.notifier.notify(Notice::info(
                "Item marked",
                format!("{} was marked as bought.", item.name),
            ));
        } else {
            self.notifier.notify(Notice::info(
                "Item unmarked",
                format!("{} was unmarked.", item.name),
            ));
        }
        Ok(completed)
    }

    /// Applies a partial field patch remotely and, on success, shallow-
    /// merges it into the matching item.
    pub async fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> Result<(), ItemStoreError> {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            self.notifier
                .notify(Notice::error("Item not found", "The item no longer exists."));
            return Err(ItemStoreError::UnknownItem);
        };

        let name = match &patch.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    self.notifier.notify(Notice::error(
                        "Invalid item",
                        "The item name cannot be empty.",
                    ));
                    return Err(ItemStoreError::InvalidName);
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        // Validate the quantity against the unit the item will end up with.
        let effective_unit = patch.unit.unwrap_or(self.items[index].unit);
        if let Some(quantity) = patch.quantity {
            if let Err(e) = validate_quantity(quantity, effective_unit) {
                self.notifier.notify(Notice::error(
                    "Invalid quantity",
                    "Quantity must be positive, and whole for count-based units.",
                ));
                return Err(e);
            }
        }
        if let Some(price) = patch.price {
            if let Err(e) = validate_price(price) {
                self.notifier.notify(Notice::error(
                    "Invalid price",
                    "Price must be zero or positive.",
                ));
                return Err(e);
            }
        }

        let changes = ItemChanges {
            name: name.clone(),
            quantity: patch.quantity,
            unit: patch.unit,
            price: patch.price,
            ..Default::default()
        };

        if let Err(e) = self.backend.update_item(id, changes).await {
            self.notifier.notify(Notice::error(
                "Could not update item",
                "The item could not be updated.",
            ));
            return Err(e.into());
        }

        let item = &mut self.items[index];
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            item.unit = unit;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }

        self.notifier
            .notify(Notice::info("Item updated", "Your changes were saved."));
        Ok(())
    }

    /// Deletes one item.
    pub async fn remove_item(&mut self, id: Uuid) -> Result<(), ItemStoreError> {
        let Some(item) = self.items.iter().find(|i| i.id == id) else {
            self.notifier
                .notify(Notice::error("Item not found", "The item no longer exists."));
            return Err(ItemStoreError::UnknownItem);
        };
        let name = item.name.clone();

        if let Err(e) = self.backend.delete_item(id).await {
            self.notifier.notify(Notice::error(
                "Could not remove item",
                "The item could not be removed.",
            ));
            return Err(e.into());
        }

        self.items.retain(|i| i.id != id);
        self.notifier.notify(Notice::info(
            "Item removed",
            format!("{} was removed from the list.", name),
        ));
        Ok(())
    }

    /// Removes every completed item with one batched delete. Returns how
    /// many were removed; an empty completed subset skips the remote call
    /// entirely.
    pub async fn clear_completed(&mut self) -> Result<usize, ItemStoreError> {
        let ids: Vec<Uuid> = self
            .items
            .iter()
            .filter(|i| i.completed)
            .map(|i| i.id)
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.backend.delete_items(&ids).await {
            self.notifier.notify(Notice::error(
                "Could not clean list",
                "The bought items could not be removed.",
            ));
            return Err(e.into());
        }

        self.items.retain(|i| !i.completed);
        self.notifier.notify(Notice::info(
            "List cleaned",
            format!("{} bought item(s) were removed.", ids.len()),
        ));
        Ok(ids.len())
    }

    /// Deletes every item of the list, scoped by list id (not by an
    /// explicit id set).
    pub async fn clear_all(
        &mut self,
        session: Option<&Session>,
        list_id: Option<Uuid>,
    ) -> Result<(), ItemStoreError> {
        if session.is_none() {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to clean the list.",
            ));
            return Err(ItemStoreError::NotAuthenticated);
        }
        let Some(list_id) = list_id else {
            self.notifier.notify(Notice::error(
                "No list selected",
                "Select a list before cleaning it.",
            ));
            return Err(ItemStoreError::NoListSelected);
        };

        if let Err(e) = self.backend.delete_list_items(list_id).await {
            self.notifier.notify(Notice::error(
                "Could not clean list",
                "The list could not be cleaned.",
            ));
            return Err(e.into());
        }

        self.items.clear();
        self.notifier.notify(Notice::info(
            "List cleaned",
            "All items were removed from the list.",
        ));
        Ok(())
    }
}

fn validate_quantity(quantity: f64, unit: Unit) -> Result<(), ItemStoreError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ItemStoreError::InvalidQuantity);
    }
    if !unit.allows_fractional() && quantity.fract() != 0.0 {
        return Err(ItemStoreError::InvalidQuantity);
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), ItemStoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ItemStoreError::InvalidPrice);
    }
    Ok(())
}

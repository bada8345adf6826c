//! List Store: the unified view of "my lists" plus "lists shared with me",
//! and the current-list selection.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::{Backend, BackendError, NewList};
use crate::models::{ShareGrant, ShoppingList};
use crate::notify::{Notice, Notifier};
use crate::session::Session;

use super::LoadToken;

/// Errors from List Store operations.
#[derive(Debug)]
pub enum ListStoreError {
    /// Operation attempted with no session; rejected before any remote call.
    NotAuthenticated,
    /// List name empty after trimming.
    InvalidName,
    /// The list does not exist in the loaded set, or the delete matched
    /// nothing (unknown id or not the owner).
    UnknownList,
    /// Share target email resolved to no known user.
    UserNotFound,
    /// A grant for this (list, user) pair already exists.
    AlreadyShared,
    /// Remote call failed.
    Backend(BackendError),
}

impl std::fmt::Display for ListStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListStoreError::NotAuthenticated => write!(f, "Not signed in"),
            ListStoreError::InvalidName => write!(f, "List name cannot be empty"),
            ListStoreError::UnknownList => write!(f, "List not found"),
            ListStoreError::UserNotFound => write!(f, "No user exists with that email"),
            ListStoreError::AlreadyShared => {
                write!(f, "This list is already shared with that user")
            }
            ListStoreError::Backend(e) => write!(f, "Backend error: {}", e),
        }
    }
}

impl std::error::Error for ListStoreError {}

impl From<BackendError> for ListStoreError {
    fn from(e: BackendError) -> Self {
        ListStoreError::Backend(e)
    }
}

/// Holds the list collection and the current selection.
///
/// Mutations are remote-first: local state changes only after the service
/// confirms the write. Failures emit one notice and leave state untouched.
pub struct ListStore {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    lists: Vec<ShoppingList>,
    current: Option<Uuid>,
    generation: u64,
    loading: bool,
}

impl ListStore {
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            lists: Vec::new(),
            current: None,
            generation: 0,
            loading: true,
        }
    }

    /// The loaded lists: owned first, then shared.
    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    pub fn current_list_id(&self) -> Option<Uuid> {
        self.current
    }

    pub fn current_list(&self) -> Option<&ShoppingList> {
        self.current
            .and_then(|id| self.lists.iter().find(|l| l.id == id))
    }

    /// True while a load is in flight (and before the first load lands).
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Starts a load, invalidating any load still in flight.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        self.loading = true;
        LoadToken(self.generation)
    }

    /// Applies a completed load. Returns false (discarding the result) when
    /// a newer load has started since `token` was issued.
    pub fn finish_load(&mut self, token: LoadToken, lists: Vec<ShoppingList>) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.lists = lists;
        self.loading = false;
        // Keep the selection when it survives the reload; otherwise fall
        // back to the first list in the combined ordering, or none.
        match self.current {
            Some(id) if self.lists.iter().any(|l| l.id == id) => {}
            _ => self.current = self.lists.first().map(|l| l.id),
        }
        true
    }

    fn abort_load(&mut self, token: LoadToken) {
        if token.0 == self.generation {
            self.loading = false;
        }
    }

    /// Loads owned and shared lists for the session's user.
    ///
    /// Without a session the store clears to the empty state (not an
    /// error). A failure fetching owned lists aborts the load; a failure
    /// on the shared leg degrades to owned-only.
    pub async fn load_lists(&mut self, session: Option<&Session>) -> Result<(), ListStoreError> {
        let token = self.begin_load();

        let Some(session) = session else {
            self.finish_load(token, Vec::new());
            return Ok(());
        };
        let user_id = session.user.id;

        let owned = match self.backend.owned_lists(user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                self.abort_load(token);
                self.notifier.notify(Notice::error(
                    "Could not load lists",
                    "Your lists could not be loaded. Try again.",
                ));
                return Err(e.into());
            }
        };

        let shared = match self.backend.shared_lists(user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("failed to load shared lists: {}", e);
                Vec::new()
            }
        };

        // Owned first, shared second; the concatenation order drives
        // default-selection tie-breaking.
        let mut lists: Vec<ShoppingList> =
            owned.into_iter().map(|r| r.into_list(false)).collect();
        lists.extend(shared.into_iter().map(|r| r.into_list(true)));

        self.finish_load(token, lists);
        Ok(())
    }

    /// Creates an owned list, prepends it, and makes it current.
    pub async fn create_list(
        &mut self,
        session: Option<&Session>,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid, ListStoreError> {
        let Some(session) = session else {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to create a list.",
            ));
            return Err(ListStoreError::NotAuthenticated);
        };

        let name = name.trim();
        if name.is_empty() {
            self.notifier.notify(Notice::error(
                "Invalid name",
                "The list name cannot be empty.",
            ));
            return Err(ListStoreError::InvalidName);
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let new = NewList {
            user_id: session.user.id,
            name: name.to_string(),
            description,
        };

        let row = match self.backend.insert_list(new).await {
            Ok(row) => row,
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Could not create list",
                    "The list could not be created. Try again.",
                ));
                return Err(e.into());
            }
        };

        let list = row.into_list(false);
        let id = list.id;
        self.lists.insert(0, list);
        self.current = Some(id);

        self.notifier.notify(Notice::info(
            "List created",
            format!("\"{}\" was created.", name),
        ));
        Ok(id)
    }

    /// Deletes a list, scoped to its owner. Items and grants cascade on
    /// the service side; nothing is patched locally beyond the list set
    /// and the selection fallback.
    pub async fn delete_list(
        &mut self,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<(), ListStoreError> {
        let Some(session) = session else {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to delete a list.",
            ));
            return Err(ListStoreError::NotAuthenticated);
        };

        match self.backend.delete_list(id, session.user.id).await {
            Ok(true) => {}
            Ok(false) => {
                self.notifier.notify(Notice::error(
                    "Could not delete list",
                    "List not found, or you are not its owner.",
                ));
                return Err(ListStoreError::UnknownList);
            }
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Could not delete list",
                    "The list could not be deleted. Try again.",
                ));
                return Err(e.into());
            }
        }

        self.lists.retain(|l| l.id != id);
        if self.current == Some(id) {
            self.current = self.lists.first().map(|l| l.id);
        }

        self.notifier
            .notify(Notice::info("List deleted", "The list was deleted."));
        Ok(())
    }

    /// Shares a list with the user behind `email`.
    ///
    /// Resolution goes through the unique email column on profiles;
    /// duplicate grants are rejected atomically by the storage layer's
    /// uniqueness constraint, not by a read-then-write check.
    pub async fn share_list(
        &mut self,
        session: Option<&Session>,
        list_id: Uuid,
        email: &str,
    ) -> Result<ShareGrant, ListStoreError> {
        if session.is_none() {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to share a list.",
            ));
            return Err(ListStoreError::NotAuthenticated);
        }

        let email = email.trim();
        let profile = match self.backend.find_profile_by_email(email).await {
            Ok(profile) => profile,
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Could not share list",
                    "The user lookup failed. Try again.",
                ));
                return Err(e.into());
            }
        };

        let Some(profile) = profile else {
            self.notifier.notify(Notice::error(
                "User not found",
                "No user exists with that email.",
            ));
            return Err(ListStoreError::UserNotFound);
        };

        let grant = match self.backend.insert_grant(list_id, profile.id).await {
            Ok(row) => row.into_grant(),
            Err(BackendError::Conflict) => {
                self.notifier.notify(Notice::error(
                    "Already shared",
                    "This list is already shared with that user.",
                ));
                return Err(ListStoreError::AlreadyShared);
            }
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Could not share list",
                    "The list could not be shared. Try again.",
                ));
                return Err(e.into());
            }
        };

        self.notifier.notify(Notice::info(
            "List shared",
            format!("The list was shared with {}.", email),
        ));
        Ok(grant)
    }

    /// Removes a share grant and refreshes the whole list set; there is no
    /// local patch for unshare. Selection is preserved by the reload.
    pub async fn unshare_list(
        &mut self,
        session: Option<&Session>,
        list_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ListStoreError> {
        let Some(session) = session else {
            self.notifier.notify(Notice::error(
                "Not signed in",
                "You need to be signed in to manage sharing.",
            ));
            return Err(ListStoreError::NotAuthenticated);
        };

        if let Err(e) = self.backend.delete_grant(list_id, user_id).await {
            self.notifier.notify(Notice::error(
                "Could not remove share",
                "The share could not be removed. Try again.",
            ));
            return Err(e.into());
        }

        self.notifier
            .notify(Notice::info("Share removed", "The share was removed."));

        self.load_lists(Some(session)).await
    }

    /// Explicit user selection of a list already in the loaded set.
    pub fn select_list(&mut self, id: Uuid) -> Result<(), ListStoreError> {
        if !self.lists.iter().any(|l| l.id == id) {
            return Err(ListStoreError::UnknownList);
        }
        self.current = Some(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::notify::{RecordingNotifier, Severity};
    use crate::session::AuthUser;

    fn setup() -> (Arc<MemoryBackend>, Arc<RecordingNotifier>, ListStore) {
        let backend = Arc::new(MemoryBackend::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = ListStore::new(backend.clone(), notifier.clone());
        (backend, notifier, store)
    }

    fn session_for(id: Uuid, email: &str) -> Session {
        Session {
            user: AuthUser {
                id,
                email: email.to_string(),
            },
            access_token: "test-token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_without_session_is_empty_state() {
        let (_, _, mut store) = setup();

        store.load_lists(None).await.unwrap();

        assert!(store.lists().is_empty());
        assert!(store.current_list_id().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_first_load_selects_first_list() {
        let (backend, notifier, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();
        let newest = store
            .create_list(Some(&session), "Hardware", None)
            .await
            .unwrap();

        // A fresh store starts unselected and picks the first list of the
        // combined ordering (owned, newest first).
        let mut fresh = ListStore::new(backend, notifier);
        fresh.load_lists(Some(&session)).await.unwrap();

        assert_eq!(fresh.lists().len(), 2);
        assert_eq!(fresh.lists()[0].name, "Hardware");
        assert_eq!(fresh.current_list_id(), Some(newest));
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let (_, notifier, mut store) = setup();

        let err = store.create_list(None, "Groceries", None).await.unwrap_err();

        assert!(matches!(err, ListStoreError::NotAuthenticated));
        assert!(store.lists().is_empty());
        assert_eq!(notifier.last().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_create_trims_name_and_selects() {
        let (_, _, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        let id = store
            .create_list(Some(&session), "  Groceries  ", Some("  weekly  "))
            .await
            .unwrap();

        assert_eq!(store.lists().len(), 1);
        assert_eq!(store.lists()[0].name, "Groceries");
        assert_eq!(store.lists()[0].description.as_deref(), Some("weekly"));
        assert_eq!(store.current_list_id(), Some(id));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (_, _, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        let err = store
            .create_list(Some(&session), "   ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ListStoreError::InvalidName));
        assert!(store.lists().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_leaves_state_untouched() {
        let (backend, notifier, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();

        backend.set_failing(true);
        let err = store
            .create_list(Some(&session), "Hardware", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ListStoreError::Backend(_)));
        assert_eq!(store.lists().len(), 1);
        assert_eq!(notifier.last().unwrap().title, "Could not create list");
    }

    #[tokio::test]
    async fn test_delete_current_falls_back_to_remaining_then_none() {
        let (_, _, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        let first = store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();
        let second = store
            .create_list(Some(&session), "Hardware", None)
            .await
            .unwrap();
        assert_eq!(store.current_list_id(), Some(second));

        store.delete_list(Some(&session), second).await.unwrap();
        assert_eq!(store.current_list_id(), Some(first));

        store.delete_list(Some(&session), first).await.unwrap();
        assert!(store.current_list_id().is_none());
        assert!(store.lists().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_matches_nothing() {
        let (backend, _, mut store) = setup();
        let owner = Session::fixture("alice@example.com");
        let stranger = Session::fixture("mallory@example.com");

        let id = store
            .create_list(Some(&owner), "Groceries", None)
            .await
            .unwrap();

        let mut other = ListStore::new(backend.clone(), Arc::new(RecordingNotifier::default()));
        let err = other.delete_list(Some(&stranger), id).await.unwrap_err();

        assert!(matches!(err, ListStoreError::UnknownList));
        assert_eq!(backend.owned_lists(owner.user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_share_creates_single_grant() {
        let (backend, _, mut store) = setup();
        let session = Session::fixture("alice@example.com");
        let bob_id = backend.add_profile("bob@example.com");

        let id = store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();

        let grant = store
            .share_list(Some(&session), id, "bob@example.com")
            .await
            .unwrap();

        assert_eq!(grant.list_id, id);
        assert_eq!(grant.grantee_id, bob_id);
        assert_eq!(backend.grants().len(), 1);
        assert_eq!(backend.grants()[0].list_id, id);
    }

    #[tokio::test]
    async fn test_share_with_unknown_email() {
        let (backend, notifier, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        let id = store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();

        let err = store
            .share_list(Some(&session), id, "nobody@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ListStoreError::UserNotFound));
        assert!(backend.grants().is_empty());
        assert_eq!(notifier.last().unwrap().title, "User not found");
    }

    #[tokio::test]
    async fn test_duplicate_share_reports_and_keeps_one_grant() {
        let (backend, notifier, mut store) = setup();
        let session = Session::fixture("alice@example.com");
        backend.add_profile("bob@example.com");

        let id = store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();

        store
            .share_list(Some(&session), id, "bob@example.com")
            .await
            .unwrap();
        let err = store
            .share_list(Some(&session), id, "bob@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ListStoreError::AlreadyShared));
        assert_eq!(backend.grants().len(), 1);
        assert_eq!(notifier.last().unwrap().title, "Already shared");
    }

    #[tokio::test]
    async fn test_shared_list_visible_to_grantee_until_unshare() {
        let (backend, _, mut store) = setup();
        let alice = Session::fixture("alice@example.com");
        let bob_id = backend.add_profile("bob@example.com");
        let bob = session_for(bob_id, "bob@example.com");

        let id = store
            .create_list(Some(&alice), "Groceries", None)
            .await
            .unwrap();
        store
            .share_list(Some(&alice), id, "bob@example.com")
            .await
            .unwrap();

        let mut bob_store =
            ListStore::new(backend.clone(), Arc::new(RecordingNotifier::default()));
        bob_store.load_lists(Some(&bob)).await.unwrap();

        assert_eq!(bob_store.lists().len(), 1);
        assert!(bob_store.lists()[0].shared);
        assert_eq!(bob_store.lists()[0].shared_by, Some(alice.user.id));

        // Owner revokes; the refresh keeps the owner's own selection.
        store
            .unshare_list(Some(&alice), id, bob_id)
            .await
            .unwrap();
        assert_eq!(store.current_list_id(), Some(id));

        bob_store.load_lists(Some(&bob)).await.unwrap();
        assert!(bob_store.lists().is_empty());
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let (_, _, mut store) = setup();

        let stale = store.begin_load();
        let current = store.begin_load();

        let list = ShoppingList {
            id: Uuid::new_v4(),
            name: "Stale".to_string(),
            description: None,
            owner_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            shared: false,
            shared_by: None,
        };
        assert!(!store.finish_load(stale, vec![list]));
        assert!(store.lists().is_empty());
        assert!(store.is_loading());

        assert!(store.finish_load(current, Vec::new()));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_existing_lists() {
        let (backend, notifier, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();
        store.load_lists(Some(&session)).await.unwrap();
        assert_eq!(store.lists().len(), 1);

        backend.set_failing(true);
        let err = store.load_lists(Some(&session)).await.unwrap_err();

        assert!(matches!(err, ListStoreError::Backend(_)));
        assert_eq!(store.lists().len(), 1);
        assert_eq!(notifier.last().unwrap().title, "Could not load lists");
    }

    #[tokio::test]
    async fn test_select_list_requires_membership() {
        let (_, _, mut store) = setup();
        let session = Session::fixture("alice@example.com");

        let a = store
            .create_list(Some(&session), "Groceries", None)
            .await
            .unwrap();
        let b = store
            .create_list(Some(&session), "Hardware", None)
            .await
            .unwrap();
        assert_eq!(store.current_list_id(), Some(b));

        store.select_list(a).unwrap();
        assert_eq!(store.current_list_id(), Some(a));

        let err = store.select_list(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ListStoreError::UnknownList));
        assert_eq!(store.current_list_id(), Some(a));
    }
}

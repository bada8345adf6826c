//! HTTP backend speaking the managed service's PostgREST dialect.
//!
//! Filters go in the query string (`?user_id=eq.<id>`, `?id=in.(a,b)`),
//! ordering via `order=created_at.desc`, and inserts ask for the confirmed
//! row back with `Prefer: return=representation`. Requests carry the
//! project API key plus a bearer token; row-level security on the service
//! side scopes every query to the authenticated user.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{
    Backend, BackendError, GrantRow, ItemChanges, ItemRow, ListRow, NewItem, NewList, Profile,
};

const LISTS_TABLE: &str = "shopping_lists";
const ITEMS_TABLE: &str = "shopping_items";
const GRANTS_TABLE: &str = "list_shared_users";
const PROFILES_TABLE: &str = "profiles";

/// Client for the hosted data service's REST interface.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend for a service at `base_url` using the project
    /// `api_key`. Without an access token, requests run as the anonymous
    /// role and row-level security hides every row.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attaches a session access token; subsequent requests run as that user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builds the REST URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            table
        )
    }

    /// An `in.(...)` membership filter over a set of ids.
    fn in_filter(ids: &[Uuid]) -> String {
        let joined = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("in.({})", joined)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Maps a response status into the backend error taxonomy.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(BackendError::Unauthorized),
            409 => Err(BackendError::Conflict),
            code => Err(BackendError::Status(code, body)),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .request(reqwest::Method::GET, &self.rest_url(table))
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Inserts a row and returns the server-confirmed representation.
    async fn insert_returning<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .request(reqwest::Method::POST, &self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let rows: Vec<T> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))
    }

    async fn delete_where(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.rest_url(table))
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    /// Delete that reports how many rows matched, used where the caller
    /// must distinguish "deleted" from "nothing to delete".
    async fn delete_where_counting(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<usize, BackendError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.rest_url(table))
            .header("Prefer", "return=representation")
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let rows: Vec<serde_json::Value> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(rows.len())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn owned_lists(&self, owner: Uuid) -> Result<Vec<ListRow>, BackendError> {
        self.fetch_rows(
            LISTS_TABLE,
            &[
                ("user_id", format!("eq.{}", owner)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn shared_lists(&self, grantee: Uuid) -> Result<Vec<ListRow>, BackendError> {
        let grants: Vec<GrantRow> = self
            .fetch_rows(
                GRANTS_TABLE,
                &[("shared_with", format!("eq.{}", grantee))],
            )
            .await?;

        if grants.is_empty() {
            return Ok(Vec::new());
        }

        let list_ids: Vec<Uuid> = grants.iter().map(|g| g.list_id).collect();
        self.fetch_rows(
            LISTS_TABLE,
            &[
                ("id", Self::in_filter(&list_ids)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_list(&self, new: NewList) -> Result<ListRow, BackendError> {
        self.insert_returning(LISTS_TABLE, &new).await
    }

    async fn delete_list(&self, id: Uuid, owner: Uuid) -> Result<bool, BackendError> {
        let deleted = self
            .delete_where_counting(
                LISTS_TABLE,
                &[
                    ("id", format!("eq.{}", id)),
                    ("user_id", format!("eq.{}", owner)),
                ],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, BackendError> {
        let rows: Vec<Profile> = self
            .fetch_rows(PROFILES_TABLE, &[("email", format!("eq.{}", email))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<GrantRow, BackendError> {
        let body = serde_json::json!({
            "list_id": list_id,
            "shared_with": grantee,
        });
        self.insert_returning(GRANTS_TABLE, &body).await
    }

    async fn delete_grant(&self, list_id: Uuid, grantee: Uuid) -> Result<(), BackendError> {
        self.delete_where(
            GRANTS_TABLE,
            &[
                ("list_id", format!("eq.{}", list_id)),
                ("shared_with", format!("eq.{}", grantee)),
            ],
        )
        .await
    }

    async fn items(&self, list_id: Uuid) -> Result<Vec<ItemRow>, BackendError> {
        self.fetch_rows(
            ITEMS_TABLE,
            &[
                ("list_id", format!("eq.{}", list_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_item(&self, new: NewItem) -> Result<ItemRow, BackendError> {
        self.insert_returning(ITEMS_TABLE, &new).await
    }

    async fn update_item(&self, id: Uuid, changes: ItemChanges) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::PATCH, &self.rest_url(ITEMS_TABLE))
            .query(&[("id", format!("eq.{}", id))])
            .json(&changes)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete_where(ITEMS_TABLE, &[("id", format!("eq.{}", id))])
            .await
    }

    async fn delete_items(&self, ids: &[Uuid]) -> Result<(), BackendError> {
        self.delete_where(ITEMS_TABLE, &[("id", Self::in_filter(ids))])
            .await
    }

    async fn delete_list_items(&self, list_id: Uuid) -> Result<(), BackendError> {
        self.delete_where(ITEMS_TABLE, &[("list_id", format!("eq.{}", list_id))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url() {
        let backend = HttpBackend::new("http://localhost:54321", "anon-key");
        assert_eq!(
            backend.rest_url("shopping_lists"),
            "http://localhost:54321/rest/v1/shopping_lists"
        );

        let backend = HttpBackend::new("https://project.example.co/", "anon-key");
        assert_eq!(
            backend.rest_url("profiles"),
            "https://project.example.co/rest/v1/profiles"
        );
    }

    #[test]
    fn test_in_filter() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            HttpBackend::in_filter(&[a, b]),
            format!("in.({},{})", a, b)
        );
        assert_eq!(HttpBackend::in_filter(&[]), "in.()");
    }

    #[test]
    fn test_access_token_replaces_anon_bearer() {
        let backend = HttpBackend::new("http://localhost:54321", "anon-key");
        assert!(backend.access_token.is_none());

        let backend = backend.with_access_token("user-token");
        assert_eq!(backend.access_token.as_deref(), Some("user-token"));
    }
}

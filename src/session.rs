//! Session and identity client for the managed service's auth API.
//!
//! The stores never read ambient session state: every operation that needs
//! identity takes the session explicitly, so tests can inject arbitrary
//! user fixtures without process-wide state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated session: who the user is plus the bearer token that
/// scopes data-service requests to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: AuthUser,
    pub access_token: String,
}

impl Session {
    /// Builds a session fixture. Handy in tests; the token carries no
    /// meaning outside the hosted service.
    pub fn fixture(email: &str) -> Self {
        Self {
            user: AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
            },
            access_token: "fixture-token".to_string(),
        }
    }
}

/// Errors from the auth API.
#[derive(Debug)]
pub enum SessionError {
    /// Transport-level failure.
    Http(String),
    /// Email/password rejected.
    InvalidCredentials,
    /// Service responded with a non-success status.
    Status(u16, String),
    /// Response body could not be decoded.
    Decode(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Http(e) => write!(f, "HTTP error: {}", e),
            SessionError::InvalidCredentials => write!(f, "Invalid email or password"),
            SessionError::Status(code, body) => {
                write!(f, "Auth server returned status {}: {}", code, body)
            }
            SessionError::Decode(e) => write!(f, "Failed to decode auth response: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Client for sign-in/sign-up/sign-out against the service's auth endpoints.
#[derive(Debug, Clone)]
pub struct SessionClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds an auth URL for a given path.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Exchanges email and password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| SessionError::Http(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            return Err(SessionError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Status(status.as_u16(), body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        Ok(Session {
            user: token.user,
            access_token: token.access_token,
        })
    }

    /// Registers a new account and signs it in. The display name lands in
    /// the user's profile row via service-side metadata handling.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, SessionError> {
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "display_name": display_name },
            }))
            .send()
            .await
            .map_err(|e| SessionError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Status(status.as_u16(), body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        Ok(Session {
            user: token.user,
            access_token: token.access_token,
        })
    }

    /// Revokes the session's token server-side. Local state is the
    /// caller's to discard.
    pub async fn sign_out(&self, session: &Session) -> Result<(), SessionError> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", session.access_token),
            )
            .send()
            .await
            .map_err(|e| SessionError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Status(status.as_u16(), body));
        }
        Ok(())
    }

    /// Fetches the identity behind a token, validating it is still live.
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, SessionError> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| SessionError::Http(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(SessionError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url() {
        let client = SessionClient::new("http://localhost:54321", "anon-key");
        assert_eq!(client.auth_url("token"), "http://localhost:54321/auth/v1/token");

        let client = SessionClient::new("https://project.example.co/", "anon-key");
        assert_eq!(
            client.auth_url("signup"),
            "https://project.example.co/auth/v1/signup"
        );
    }

    #[test]
    fn test_session_yaml_roundtrip() {
        let session = Session::fixture("alice@example.com");
        let yaml = serde_yaml::to_string(&session).unwrap();
        let parsed: Session = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, session);
    }
}

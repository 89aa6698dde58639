//!
//! # Typed API client
//!
//! A thin client over the HTTP+JSON API for frontends and scripts. The bearer
//! token lives in an explicit [`Session`] value with three lifecycle states
//! (absent, valid, expired) and is passed into every call that needs one;
//! there is no ambient token storage. Expiry is checked locally before each
//! request; the server still re-verifies on its side.
//!
//! Any non-2xx response surfaces as [`ClientError::Api`] with the server's
//! message, after being logged. Callers are expected to treat all of them as
//! a generic failure state; nothing is retried.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use uuid::Uuid;

use crate::auth::AuthResponse;
use crate::models::{Task, TaskInput, TaskQuery, TaskUpdate, UserResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No login has happened yet.
    #[error("no active session")]
    NoSession,
    /// The session's token has passed its expiry; a fresh login is required.
    #[error("session expired")]
    SessionExpired,
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Client-side authentication state.
///
/// `Valid` does not guarantee the server will accept the token, only that
/// its recorded expiry has not passed. Use [`Session::tick`] to demote a
/// stale `Valid` to `Expired` in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Absent,
    Valid {
        token: String,
        expires_at: DateTime<Utc>,
    },
    Expired,
}

impl Session {
    /// Builds a live session from a signup/login response.
    pub fn from_auth(auth: &AuthResponse) -> Self {
        Session::Valid {
            token: auth.token.clone(),
            expires_at: auth.expires_at,
        }
    }

    /// The bearer token, if the session is currently usable.
    pub fn bearer(&self) -> Result<&str, ClientError> {
        match self {
            Session::Absent => Err(ClientError::NoSession),
            Session::Valid { token, expires_at } => {
                if *expires_at > Utc::now() {
                    Ok(token)
                } else {
                    Err(ClientError::SessionExpired)
                }
            }
            Session::Expired => Err(ClientError::SessionExpired),
        }
    }

    /// Demotes a past-expiry `Valid` session to `Expired`.
    pub fn tick(&mut self) {
        if let Session::Valid { expires_at, .. } = self {
            if *expires_at <= Utc::now() {
                *self = Session::Expired;
            }
        }
    }
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(Session, UserResponse), ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/auth/signup", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await?;
        let auth: AuthResponse = Self::parse(resp).await?;
        Ok((Session::from_auth(&auth), auth.user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password
            }))
            .send()
            .await?;
        let auth: AuthResponse = Self::parse(resp).await?;
        Ok(Session::from_auth(&auth))
    }

    pub async fn me(&self, session: &Session) -> Result<UserResponse, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn list_tasks(
        &self,
        session: &Session,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }
        if let Some(priority) = query.priority {
            params.push(("priority", priority.to_string()));
        }
        if let Some(sort) = query.sort_by {
            params.push(("sort_by", sort.as_str().to_string()));
        }

        let resp = self
            .http
            .get(format!("{}/api/tasks", self.base_url))
            .query(&params)
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn create_task(
        &self,
        session: &Session,
        input: &TaskInput,
    ) -> Result<Task, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/tasks", self.base_url))
            .json(input)
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn get_task(&self, session: &Session, id: Uuid) -> Result<Task, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/tasks/{}", self.base_url, id))
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn update_task(
        &self,
        session: &Session,
        id: Uuid,
        patch: &TaskUpdate,
    ) -> Result<Task, ClientError> {
        let resp = self
            .http
            .put(format!("{}/api/tasks/{}", self.base_url, id))
            .json(patch)
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn toggle_task(&self, session: &Session, id: Uuid) -> Result<Task, ClientError> {
        let resp = self
            .http
            .patch(format!("{}/api/tasks/{}/toggle", self.base_url, id))
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::parse(resp).await
    }

    pub async fn delete_task(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(format!("{}/api/tasks/{}", self.base_url, id))
            .bearer_auth(session.bearer()?)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Checks the status and deserializes a JSON body.
    async fn parse<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Turns a non-2xx response into `ClientError::Api`, logging it.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        log::warn!("API call failed with {}: {}", status, message);
        Err(ClientError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auth_response(expires_in: Duration) -> AuthResponse {
        AuthResponse {
            token: "header.payload.signature".to_string(),
            expires_at: Utc::now() + expires_in,
            user: UserResponse {
                id: 1,
                name: "John".to_string(),
                email: "john@example.com".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_absent_session_has_no_bearer() {
        assert!(matches!(
            Session::Absent.bearer(),
            Err(ClientError::NoSession)
        ));
    }

    #[test]
    fn test_live_session_yields_token() {
        let session = Session::from_auth(&auth_response(Duration::minutes(30)));
        assert_eq!(session.bearer().unwrap(), "header.payload.signature");
    }

    #[test]
    fn test_past_expiry_session_is_unusable() {
        let session = Session::from_auth(&auth_response(Duration::minutes(-1)));
        assert!(matches!(
            session.bearer(),
            Err(ClientError::SessionExpired)
        ));
    }

    #[test_log::test]
    fn test_tick_demotes_stale_session() {
        let mut session = Session::from_auth(&auth_response(Duration::minutes(-1)));
        session.tick();
        assert_eq!(session, Session::Expired);

        // A live session is untouched
        let mut live = Session::from_auth(&auth_response(Duration::minutes(30)));
        live.tick();
        assert!(matches!(live, Session::Valid { .. }));
    }
}

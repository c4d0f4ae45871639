//! # Upstream User Provider
//!
//! The [`UserApi`] trait is the seam between [`crate::UserService`] and whatever
//! serves the read-only user listing.  Two implementations ship with the crate:
//!
//! - [`HttpUserApi`]: a reqwest client for a JSONPlaceholder-style remote
//!   (`GET /users`, `GET /users/{id}`).
//! - [`StaticUserApi`]: a fixed in-memory listing, used by tests and by the
//!   daemon's offline fixture mode.
//!
//! Implementations perform exactly one attempt per call.  Timeouts belong to the
//! implementation; the service imposes none.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::{UpstreamError, User};

/// Read-only access to the upstream user listing.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// Fetches the full listing, in upstream order.
    async fn list_users(&self) -> Result<Vec<User>, UpstreamError>;

    /// Fetches a single user.  An absent id fails with status 404.
    async fn get_user(&self, id: u64) -> Result<User, UpstreamError>;
}

///////////////////////////////////////////// HttpUserApi //////////////////////////////////////////////

/// Base URL of the public JSONPlaceholder service.
pub const DEFAULT_UPSTREAM_URL: &str = "https://jsonplaceholder.typicode.com";

/// [`UserApi`] backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpUserApi {
    client: Client,
    base_url: String,
}

impl HttpUserApi {
    /// Creates a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Constructs a full URL from a path
    fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T>(&self, path: &str) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "upstream GET");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// Deserializes a success body or turns the status and body into an error.
    async fn handle_response<T>(response: Response) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let error = response.text().await.unwrap_or_default();
            let msg = if error.is_empty() {
                "No error details".to_string()
            } else {
                error
            };
            Err(UpstreamError::with_status(status.as_u16(), msg))
        }
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list_users(&self) -> Result<Vec<User>, UpstreamError> {
        self.get("/users").await
    }

    async fn get_user(&self, id: u64) -> Result<User, UpstreamError> {
        self.get(&format!("/users/{}", id)).await
    }
}

//////////////////////////////////////////// StaticUserApi /////////////////////////////////////////////

/// [`UserApi`] over a fixed listing.
///
/// Counts calls so callers can observe how often the upstream was consulted.
#[derive(Debug, Default)]
pub struct StaticUserApi {
    users: Vec<User>,
    failure: Option<UpstreamError>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl StaticUserApi {
    /// Serves `users` in the given order.
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    /// Fails every call with a clone of `error`.
    pub fn failing(error: UpstreamError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    /// Loads a listing from a file containing a JSON array of users.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, UpstreamError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            UpstreamError::transport(format!("failed to read {}: {}", path.display(), e))
        })?;
        let users: Vec<User> = serde_json::from_slice(&bytes).map_err(|e| {
            UpstreamError::transport(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Self::new(users))
    }

    /// Number of `list_users` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_user` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserApi for StaticUserApi {
    async fn list_users(&self) -> Result<Vec<User>, UpstreamError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.users.clone())
    }

    async fn get_user(&self, id: u64) -> Result<User, UpstreamError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| UpstreamError::with_status(404, "{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{leanne, sample_users};

    #[test]
    fn http_url_joins_paths() {
        let api = HttpUserApi::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:9");
        assert_eq!(api.url("/users"), "http://localhost:9/users");
        assert_eq!(api.url("users/3"), "http://localhost:9/users/3");
    }

    #[tokio::test]
    async fn static_lists_in_order_and_counts() {
        let api = StaticUserApi::new(sample_users());
        let ids: Vec<u64> = api.list_users().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(api.list_calls(), 1);
        assert_eq!(api.get_calls(), 0);
    }

    #[tokio::test]
    async fn static_get_absent_is_404() {
        let api = StaticUserApi::new(sample_users());
        assert_eq!(api.get_user(1).await.unwrap(), leanne());
        let err = api.get_user(999).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(api.get_calls(), 2);
    }

    #[tokio::test]
    async fn static_failing_fails_everything() {
        let api = StaticUserApi::failing(UpstreamError::with_status(502, "bad gateway"));
        assert_eq!(api.list_users().await.unwrap_err().status, Some(502));
        assert_eq!(api.get_user(1).await.unwrap_err().status, Some(502));
    }

    #[test]
    fn static_from_missing_file_fails() {
        let err = StaticUserApi::from_json_file("definitely/not/here.json").unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.message.contains("failed to read"));
    }

    #[tokio::test]
    async fn static_from_json_file() {
        let path = std::env::temp_dir().join(format!("userfacade_fixture_{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_vec(&sample_users()).unwrap()).unwrap();
        let api = StaticUserApi::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(api.list_users().await.unwrap(), sample_users());
    }
}

//! # User Service
//!
//! [`UserService`] presents the read-only upstream listing as a mutable-looking user
//! collection.  Reads delegate to the [`UserApi`]; "writes" compute the resulting
//! user and return it without persisting anything, so a later read still reflects
//! upstream state.
//!
//! Every upstream failure is translated into a [`ServiceError`]:
//!
//! | operation        | upstream failure | result                                   |
//! |------------------|------------------|------------------------------------------|
//! | listing          | any              | `Internal`, "Failed to fetch users"      |
//! | single lookup    | status 404       | `NotFound`, "User not found"             |
//! | single lookup    | anything else    | `Internal`, "Failed to fetch user"       |
//!
//! The service holds no mutable state; clones share the same upstream client.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::upstream::UserApi;
use crate::{CreateUserBody, ServiceError, UpdateUserBody, User, UserQuery};

/// Resource operations over the upstream user listing.
#[derive(Clone)]
pub struct UserService {
    api: Arc<dyn UserApi>,
}

impl UserService {
    /// Creates a service reading through `api`.
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self { api }
    }

    /// Returns the full upstream listing.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.api.list_users().await.map_err(|e| {
            warn!(status = ?e.status, error = %e, "listing users failed");
            ServiceError::internal("Failed to fetch users")
        })
    }

    /// Returns one user, or `NotFound` when the upstream reports 404.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_user(&self, id: u64) -> Result<User, ServiceError> {
        self.api.get_user(id).await.map_err(|e| {
            warn!(status = ?e.status, error = %e, "fetching user failed");
            if e.is_not_found() {
                ServiceError::not_found("User not found")
            } else {
                ServiceError::internal("Failed to fetch user")
            }
        })
    }

    /// Returns the users matching every filter in `query`, in upstream order.
    ///
    /// Always fetches the full listing; the upstream offers no targeted query.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_users(&self, query: &UserQuery) -> Result<Vec<User>, ServiceError> {
        let users = self.list_users().await?;
        if query.is_empty() {
            return Ok(users);
        }
        Ok(users.into_iter().filter(|user| user.matches(query)).collect())
    }

    /// Synthesizes a new user with id `max(existing) + 1`.
    ///
    /// An empty listing yields id 1.  The user is returned only; it is not added to
    /// any listing.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn create_user(&self, body: CreateUserBody) -> Result<User, ServiceError> {
        let users = self.list_users().await?;
        let id = next_id(&users).ok_or_else(|| {
            warn!("user id space exhausted");
            ServiceError::internal("Failed to create user")
        })?;
        Ok(User::from_create(id, body))
    }

    /// Fetches the user and merges `patch` over it.  Nothing is written upstream.
    #[instrument(level = "debug", skip(self, patch))]
    pub async fn update_user(&self, id: u64, patch: UpdateUserBody) -> Result<User, ServiceError> {
        let user = self.get_user(id).await?;
        Ok(user.merge(patch))
    }

    /// Succeeds whenever the user exists.  Nothing is removed upstream.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_user(&self, id: u64) -> Result<(), ServiceError> {
        self.get_user(id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

fn next_id(users: &[User]) -> Option<u64> {
    users.iter().map(|user| user.id).max().unwrap_or(0).checked_add(1)
}

//! # userfacade: a CRUD-shaped API over a read-only user listing
//!
//! userfacade serves `/users` endpoints in front of an upstream provider that can only
//! list users and look one up by id (JSONPlaceholder by default).  Reads pass through.
//! Creates, updates, and deletes are computed and returned but never stored: a second
//! read after a delete still shows the user, because nothing upstream changed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP API Layer (Axum routes)            │
//! ├─────────────────────────────────────────┤
//! │ Validation (untyped input -> payloads)  │
//! ├─────────────────────────────────────────┤
//! │ UserService (filtering, ids, merging)   │
//! ├─────────────────────────────────────────┤
//! │ UserApi (reqwest client or fixture)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The service never sees HTTP.  It receives validated payloads and returns either a
//! [`User`] or a [`ServiceError`] whose code the transport uses as the response status.
//!
//! ## Usage
//!
//! ```rust
//! # use std::sync::Arc;
//! # use userfacade::{StaticUserApi, User, UserQuery, UserService, UpdateUserBody};
//! # #[tokio::main]
//! # async fn main() {
//! let users = vec![User { id: 1, username: "Bret".into(), ..Default::default() }];
//! let service = UserService::new(Arc::new(StaticUserApi::new(users)));
//!
//! let query = UserQuery { username: Some("bret".into()), email: None };
//! assert_eq!(service.find_users(&query).await.unwrap().len(), 1);
//!
//! let patch = UpdateUserBody { name: Some("Leanne".into()), ..Default::default() };
//! assert_eq!(service.update_user(1, patch).await.unwrap().name, "Leanne");
//!
//! assert_eq!(service.get_user(2).await.unwrap_err().code(), 404);
//! # }
//! ```

#![deny(missing_docs)]
mod errors;
mod service;
mod user;
mod validate;

/// Server configuration resolved from flags, environment, and defaults.
pub mod config;

/// Tracing subscriber setup for binaries.
pub mod logging;

/// HTTP routes, response envelope, and error-to-status mapping.
pub mod routes;

/// The upstream user provider seam and its implementations.
pub mod upstream;

pub use config::{ConfigError, ConfigOverrides, ServerConfig};
pub use errors::{ServiceError, ServiceErrorKind, UpstreamError};
pub use routes::{create_router, create_user_router};
pub use service::UserService;
pub use upstream::{HttpUserApi, StaticUserApi, UserApi};
pub use user::{Address, Company, CreateUserBody, Geo, UpdateUserBody, User, UserQuery};
pub use validate::{
    ValidationError, ValidationIssue, is_valid_email, is_valid_url, validate_create_body,
    validate_query, validate_update_body, validate_user_id,
};

use std::collections::HashMap;

use axum::Router;
use axum::async_trait;
use axum::Form;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    ServiceError, User, UserService, ValidationError, ValidationIssue, validate_create_body,
    validate_query, validate_update_body, validate_user_id,
};

/////////////////////////////////////////////// Envelope ///////////////////////////////////////////////

/// Body of every successful response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always true.
    pub success: bool,
    /// The payload, when the operation produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable outcome for mutating operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

impl ApiResponse<()> {
    fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Body of every failed response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Always false.
    pub success: bool,
    /// Short description of the failure.
    pub error: String,
    /// Per-field problems for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
}

/// Everything a user route can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The service rejected the operation.
    Service(ServiceError),
    /// The request failed validation.
    Validation(ValidationError),
    /// The request body was not JSON.
    InvalidBody,
    /// The form-encoded request body could not be decoded.
    InvalidForm,
    /// The query string could not be decoded.
    InvalidQuery,
    /// The path parameter could not be decoded.
    InvalidPath,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// No route matched.
    RouteNotFound,
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Service(e) => (
                StatusCode::from_u16(e.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                e.message().to_string(),
                None,
            ),
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(e.issues),
            ),
            ApiError::InvalidBody => (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string(), None),
            ApiError::InvalidForm => (StatusCode::BAD_REQUEST, "Invalid form body".to_string(), None),
            ApiError::InvalidQuery => (
                StatusCode::BAD_REQUEST,
                "Invalid query string".to_string(),
                None,
            ),
            ApiError::InvalidPath => (
                StatusCode::BAD_REQUEST,
                "Invalid path parameter".to_string(),
                None,
            ),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
                None,
            ),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "Route not found".to_string(), None),
        };
        let body = ApiErrorBody {
            success: false,
            error,
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Extracts a request body as an untyped value.
///
/// `application/x-www-form-urlencoded` bodies become an object of strings, with bracketed
/// keys (`address[geo][lat]=1`) nesting into sub-objects.  Anything else must be JSON.  An
/// empty body reads as `{}`.
pub struct RequestBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|_| ApiError::InvalidForm)?;
            return Ok(RequestBody(form_to_value(fields)));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::InvalidBody)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(RequestBody(Value::Object(Map::new())));
        }
        serde_json::from_slice::<Value>(&bytes)
            .map(RequestBody)
            .map_err(|_| ApiError::InvalidBody)
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

fn form_key_path(key: &str) -> Vec<&str> {
    match key.find('[') {
        Some(open) if open > 0 && key.ends_with(']') => {
            let mut path = vec![&key[..open]];
            path.extend(key[open + 1..key.len() - 1].split("]["));
            path
        }
        _ => vec![key],
    }
}

fn insert_form_field(obj: &mut Map<String, Value>, path: &[&str], value: String) {
    match path {
        [] => {}
        [last] => {
            obj.insert(last.to_string(), Value::String(value));
        }
        [head, rest @ ..] => {
            let entry = obj
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_form_field(child, rest, value);
            }
        }
    }
}

fn form_to_value(fields: Vec<(String, String)>) -> Value {
    let mut obj = Map::new();
    for (key, value) in fields {
        insert_form_field(&mut obj, &form_key_path(&key), value);
    }
    Value::Object(obj)
}

/// Extracts the query string as a string map.
pub struct QueryParams(pub HashMap<String, String>);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| QueryParams(params))
            .map_err(|_| ApiError::InvalidQuery)
    }
}

/// Extracts the raw `:id` path segment.
pub struct IdParam(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<String>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| IdParam(id))
            .map_err(|_| ApiError::InvalidPath)
    }
}

////////////////////////////////////////////// Routes //////////////////////////////////////////////////

async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("API is running"))
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Lists users, optionally filtered by `username` and `email`.
async fn list_users(
    State(service): State<UserService>,
    QueryParams(params): QueryParams,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    debug!(?params, "list users");
    let query = validate_query(&params)?;
    let users = service.find_users(&query).await?;
    Ok(Json(ApiResponse::data(users)))
}

/// Gets a user by id.
async fn get_user(
    State(service): State<UserService>,
    IdParam(id): IdParam,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    debug!(%id, "get user");
    let id = validate_user_id(&id)?;
    let user = service.get_user(id).await?;
    Ok(Json(ApiResponse::data(user)))
}

/// Creates a user.
async fn create_user(
    State(service): State<UserService>,
    RequestBody(body): RequestBody,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    debug!("create user");
    let body = validate_create_body(&body)?;
    let user = service.create_user(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(user).with_message("User created successfully")),
    ))
}

/// Updates a user with merge-patch semantics; serves both PUT and PATCH.
async fn update_user(
    State(service): State<UserService>,
    IdParam(id): IdParam,
    RequestBody(body): RequestBody,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    debug!(%id, "update user");
    let id = validate_user_id(&id);
    let patch = validate_update_body(&body);
    let (id, patch) = match (id, patch) {
        (Ok(id), Ok(patch)) => (id, patch),
        (Err(mut e), Err(other)) => {
            e.issues.extend(other.issues);
            return Err(e.into());
        }
        (Err(e), _) | (_, Err(e)) => return Err(e.into()),
    };
    let user = service.update_user(id, patch).await?;
    Ok(Json(
        ApiResponse::data(user).with_message("User updated successfully"),
    ))
}

/// Deletes a user.
async fn delete_user(
    State(service): State<UserService>,
    IdParam(id): IdParam,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    debug!(%id, "delete user");
    let id = validate_user_id(&id)?;
    service.delete_user(id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

////////////////////////////////////////////// Router //////////////////////////////////////////////////

/// Creates an Axum router with the `/users` endpoints.
pub fn create_user_router(service: UserService) -> Router {
    Router::new()
        .route(
            "/users",
            get(list_users)
                .post(create_user)
                .fallback(method_not_allowed),
        )
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user)
                .fallback(method_not_allowed),
        )
        .with_state(service)
}

/// Creates the full application router: health check, `/users`, and a JSON 404 fallback.
pub fn create_router(service: UserService) -> Router {
    Router::new()
        .route("/", get(health))
        .merge(create_user_router(service))
        .fallback(route_not_found)
}

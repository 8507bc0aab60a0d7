use crate::todo::{
    ParseLiteralError, PartitionedTodos, Priority, Status, Todo, TodoChanges, TodoError,
    TodoFilter, TodoService,
};
use axum::{
    Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Shared state of the todo routes.
pub struct TodoState {
    service: Box<dyn TodoService>,
}

impl TodoState {
    pub fn new<S: TodoService + 'static>(service: S) -> Self {
        Self {
            service: Box::new(service),
        }
    }
}

/// JSON representation of a Todo for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    /// Unique identifier assigned on creation
    pub id: i32,
    /// What needs to be done
    pub task: String,
    pub status: Status,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id(),
            task: todo.task().to_string(),
            status: todo.status(),
            priority: todo.priority(),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
        }
    }
}

/// Envelope for a single todo.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoResponse {
    pub data: TodoJson,
}

/// Todos split by completion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoListResponse {
    /// Todos whose status is not `done`
    pub incomplete_tasks: Vec<TodoJson>,
    /// Todos whose status is `done`
    pub completed_tasks: Vec<TodoJson>,
}

impl From<PartitionedTodos> for TodoListResponse {
    fn from(todos: PartitionedTodos) -> Self {
        Self {
            incomplete_tasks: todos.incomplete.into_iter().map(TodoJson::from).collect(),
            completed_tasks: todos.completed.into_iter().map(TodoJson::from).collect(),
        }
    }
}

/// Request body for creating a todo.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    /// What needs to be done, must not be empty
    task: String,
    #[schema(value_type = Priority)]
    priority: String,
}

/// Request body for updating a todo. Omitted, `null` or empty fields are left unchanged,
/// and so is everything when the body itself is empty.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    task: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Status>)]
    status: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Priority>)]
    priority: Option<String>,
}

/// Query parameters for listing todos. Empty values are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TodoListQuery {
    /// Only todos whose task contains this text (case-insensitive)
    #[serde(default)]
    task: Option<String>,
    /// Only todos with exactly this status
    #[serde(default)]
    #[param(value_type = Option<Status>)]
    status: Option<String>,
}

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    InternalServerError,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorItem {
    pub code: ErrorCode,
    pub message: String,
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorItem>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            errors: vec![ErrorItem { code, message }],
        }
    }
}

const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

/// Error type for todo API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be parsed or holds an invalid value.
    #[error("{0}")]
    BadRequest(String),
    /// The referenced todo does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Storage or other unexpected failure.
    #[error("{0}")]
    Internal(String),
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => ApiError::NotFound("Todo not found".to_string()),
            TodoError::Database(e) => {
                tracing::error!("Todo storage failure: {}", e);
                ApiError::Internal(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<ParseLiteralError> for ApiError {
    fn from(err: ParseLiteralError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid input".to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        tracing::debug!("Rejected body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid input".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", rejection.body_text());
        ApiError::BadRequest("Invalid Todo ID".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query: {}", rejection.body_text());
        ApiError::BadRequest("Invalid query parameters".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, code, message) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, message),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                message,
            ),
        };
        (status_code, Json(ErrorResponse::new(code, message))).into_response()
    }
}

/// Treats an empty string the same as an omitted field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_non_empty<T>(value: Option<String>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = ParseLiteralError>,
{
    Ok(non_empty(value).map(|v| v.parse::<T>()).transpose()?)
}

/// Handler for POST /api/v1/todos - Creates a todo in the `created` status.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoJson),
        (status = 400, description = "Malformed body, empty task or unknown priority", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoJson>), ApiError> {
    let Json(request) = payload?;
    if request.task.is_empty() {
        return Err(ApiError::BadRequest("Task must not be empty".to_string()));
    }
    let priority = request.priority.parse::<Priority>()?;

    let todo = state.service.create(request.task, priority).await?;
    Ok((StatusCode::CREATED, Json(TodoJson::from(todo))))
}

/// Handler for PUT /api/v1/todos/{id} - Changes the given fields of a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/todos/{id}",
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Invalid ID, malformed body or unknown status/priority", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TodoResponse>, ApiError> {
    let Path(id) = id?;
    let body = body?;
    let request = if body.is_empty() {
        UpdateTodoRequest::default()
    } else {
        let Json(request) = Json::<UpdateTodoRequest>::from_bytes(&body)?;
        request
    };
    let changes = TodoChanges {
        task: non_empty(request.task),
        status: parse_non_empty(request.status)?,
        priority: parse_non_empty(request.priority)?,
    };

    let todo = state.service.update(id, changes).await?;
    Ok(Json(TodoResponse {
        data: TodoJson::from(todo),
    }))
}

/// Handler for DELETE /api/v1/todos/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/todos/{id}",
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/v1/todos/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos/{id}",
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Successfully retrieved todo", body = TodoResponse),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn find_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<TodoResponse>, ApiError> {
    let Path(id) = id?;
    let todo = state.service.find(id).await?;
    Ok(Json(TodoResponse {
        data: TodoJson::from(todo),
    }))
}

/// Handler for GET /api/v1/todos - Lists todos split into incomplete and completed.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/todos",
    params(TodoListQuery),
    responses(
        (status = 200, description = "Successfully retrieved todos", body = TodoListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn find_all_todos_handler(
    State(state): State<Arc<TodoState>>,
    query: Result<Query<TodoListQuery>, QueryRejection>,
) -> Result<Json<TodoListResponse>, ApiError> {
    let Query(query) = query?;
    let filter = TodoFilter {
        task: non_empty(query.task),
        status: parse_non_empty(query.status)?,
    };

    let todos = state.service.find_all(filter).await?;
    Ok(Json(TodoListResponse::from(todos)))
}

/// Creates and returns the todos API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route(
            "/todos",
            get(find_all_todos_handler).post(create_todo_handler),
        )
        .route(
            "/todos/{id}",
            get(find_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .with_state(state)
}

use std::sync::Arc;

use crate::todo::api::v1::{self, TodoState};

use axum::Router;
use utoipa::OpenApi;

/// OpenAPI document for the JSON API.
#[derive(OpenApi)]
#[openapi(
    info(title = "todo-server API", description = "Manage todos over HTTP"),
    paths(
        v1::create_todo_handler,
        v1::update_todo_handler,
        v1::delete_todo_handler,
        v1::find_todo_handler,
        v1::find_all_todos_handler,
    ),
    components(schemas(
        v1::TodoJson,
        v1::TodoResponse,
        v1::TodoListResponse,
        v1::CreateTodoRequest,
        v1::UpdateTodoRequest,
        v1::ErrorResponse,
        v1::ErrorItem,
        v1::ErrorCode,
        crate::todo::Status,
        crate::todo::Priority,
    )),
    tags(
        (name = "Todos", description = "Create, update, delete and list todos")
    )
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(todo_state: Arc<TodoState>) -> axum::Router {
    let todos_router = v1::create_api_router(todo_state);
    Router::new().nest("/api/v1", todos_router)
}

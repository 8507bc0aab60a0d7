use crate::entities::*;
use crate::todo::{NewTodo, Todo, TodoError, TodoFilter, TodoResult};
use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::*;
use std::sync::Arc;

/// Storage operations for todos.
///
/// Implementations are the only writers of persisted todo state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Inserts a new todo. The database assigns the ID and timestamps.
    async fn create(&self, new_todo: NewTodo) -> TodoResult<Todo>;

    /// Overwrites task, status and priority of the row with the todo's ID.
    ///
    /// A missing row is reported as a database error, not as [`TodoError::NotFound`].
    async fn update(&self, todo: Todo) -> TodoResult<Todo>;

    /// Deletes a todo by ID, failing with [`TodoError::NotFound`] when no row was removed.
    async fn delete(&self, id: i32) -> TodoResult<()>;

    /// Fetches a todo by ID, failing with [`TodoError::NotFound`] when it does not exist.
    async fn find(&self, id: i32) -> TodoResult<Todo>;

    /// Lists todos matching every filter that is set, in insertion order.
    async fn find_all(&self, filter: TodoFilter) -> TodoResult<Vec<Todo>>;
}

/// [`TodoRepository`] backed by the `todos` table.
#[derive(Clone, Debug)]
pub struct SeaOrmTodoRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTodoRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Escapes `%`, `_` and `\` so they match literally in a `LIKE` pattern.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds an `ILIKE` pattern matching `needle` anywhere in the column.
fn contains_pattern(needle: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(needle))).escape('\\')
}

#[async_trait]
impl TodoRepository for SeaOrmTodoRepository {
    #[tracing::instrument(skip(self))]
    async fn create(&self, new_todo: NewTodo) -> TodoResult<Todo> {
        let active_model = todo::ActiveModel {
            task: ActiveValue::Set(new_todo.task),
            status: ActiveValue::Set(new_todo.status.as_str().to_string()),
            priority: ActiveValue::Set(new_todo.priority.as_str().to_string()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db.as_ref()).await?;
        Todo::try_from(created_model)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, todo: Todo) -> TodoResult<Todo> {
        let active_model = todo::ActiveModel {
            id: ActiveValue::Unchanged(todo.id()),
            task: ActiveValue::Set(todo.task().to_string()),
            status: ActiveValue::Set(todo.status().as_str().to_string()),
            priority: ActiveValue::Set(todo.priority().as_str().to_string()),
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        let updated_model = active_model.update(self.db.as_ref()).await?;
        Todo::try_from(updated_model)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i32) -> TodoResult<()> {
        let result = todo::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(TodoError::NotFound(id));
        }
        tracing::info!("Deleted todo with id: {}", id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, id: i32) -> TodoResult<Todo> {
        let model = todo::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(TodoError::NotFound(id))?;
        Todo::try_from(model)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self, filter: TodoFilter) -> TodoResult<Vec<Todo>> {
        let mut query = todo::Entity::find();
        if let Some(task) = filter.task.as_deref() {
            query = query.filter(
                Expr::col((todo::Entity, todo::Column::Task)).ilike(contains_pattern(task)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(todo::Column::Status.eq(status.as_str()));
        }

        let models = query
            .order_by_asc(todo::Column::Id)
            .all(self.db.as_ref())
            .await
            .inspect_err(|e| tracing::error!("Error retrieving todos: {}", e))?;
        models.into_iter().map(Todo::try_from).collect()
    }
}

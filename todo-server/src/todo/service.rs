use crate::todo::repository::TodoRepository;
use crate::todo::{
    NewTodo, PartitionedTodos, Priority, Todo, TodoChanges, TodoFilter, TodoResult,
};
use async_trait::async_trait;

/// Business rules for todos, applied on top of a [`TodoRepository`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoService: Send + Sync {
    /// Creates a todo in the `created` status.
    async fn create(&self, task: String, priority: Priority) -> TodoResult<Todo>;

    /// Applies `changes` to the stored todo. Fields left as `None` keep their stored value.
    async fn update(&self, id: i32, changes: TodoChanges) -> TodoResult<Todo>;

    /// Removes a todo, propagating `TodoError::NotFound` when it does not exist.
    async fn delete(&self, id: i32) -> TodoResult<()>;

    /// Fetches a todo, propagating `TodoError::NotFound` when it does not exist.
    async fn find(&self, id: i32) -> TodoResult<Todo>;

    /// Lists todos matching `filter`, split into incomplete and completed ones.
    async fn find_all(&self, filter: TodoFilter) -> TodoResult<PartitionedTodos>;
}

pub struct TodoServiceImpl<R> {
    repository: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

/// Builds the record to store for an update: each changed field replaces the
/// current one, everything else is carried over from `current`.
fn merge_changes(current: &Todo, changes: TodoChanges) -> Todo {
    current.with_fields(
        changes.task.unwrap_or_else(|| current.task().to_string()),
        changes.status.unwrap_or(current.status()),
        changes.priority.unwrap_or(current.priority()),
    )
}

fn partition_by_completion(todos: Vec<Todo>) -> PartitionedTodos {
    let (completed, incomplete): (Vec<Todo>, Vec<Todo>) = todos
        .into_iter()
        .partition(|todo| todo.status().is_done());
    PartitionedTodos {
        incomplete,
        completed,
    }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    #[tracing::instrument(skip(self))]
    async fn create(&self, task: String, priority: Priority) -> TodoResult<Todo> {
        self.repository.create(NewTodo::new(task, priority)).await
    }

    // Find and update are separate statements; a concurrent update of the
    // same todo between them is overwritten.
    #[tracing::instrument(skip(self))]
    async fn update(&self, id: i32, changes: TodoChanges) -> TodoResult<Todo> {
        let current = self.find(id).await?;
        let updated = merge_changes(&current, changes);
        self.repository.update(updated).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i32) -> TodoResult<()> {
        self.repository.delete(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, id: i32) -> TodoResult<Todo> {
        self.repository.find(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self, filter: TodoFilter) -> TodoResult<PartitionedTodos> {
        let todos = self.repository.find_all(filter).await?;
        Ok(partition_by_completion(todos))
    }
}

use axum::Router;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::ContainerAsync;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use todo_server::config::Config;
use todo_server::todo::SeaOrmTodoRepository;

/// A migrated `todos` database in a throwaway PostgreSQL container.
pub struct TestContext {
    #[allow(dead_code)] // dropping the container stops the database
    container: ContainerAsync<Postgres>,
    #[allow(dead_code)]
    pub db: Arc<DatabaseConnection>,
}

impl TestContext {
    /// Repository over the test database.
    #[allow(dead_code)]
    pub fn repository(&self) -> SeaOrmTodoRepository {
        SeaOrmTodoRepository::new(Arc::clone(&self.db))
    }

    /// The full HTTP application, CORS left permissive.
    #[allow(dead_code)]
    pub fn app(&self) -> Router {
        let config = Config {
            db_url: String::new(),
            port: 8080,
            cors_allowed_origin: None,
        };
        todo_server::web::create_app(Arc::clone(&self.db), &config)
            .expect("Failed to build application")
    }
}

async fn connect_todos_db(
    container: &ContainerAsync<Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!(
        "postgres://postgres:postgres@{}:{}/postgres",
        container.get_host().await?,
        port
    );
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // Several tests per binary initialise tracing.
    let _ = tracing_subscriber::fmt().try_init();
    let container = Postgres::default().start().await?;
    let db = connect_todos_db(&container).await?;
    Ok(TestContext {
        container,
        db: Arc::new(db),
    })
}

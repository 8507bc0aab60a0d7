use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::todo::api::v1::TodoState;
use crate::todo::{SeaOrmTodoRepository, TodoServiceImpl};

pub mod api;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app(Arc::new(db), &config)?;

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires repository, service and routes together on top of a database connection.
pub fn create_app(db: Arc<DatabaseConnection>, config: &Config) -> anyhow::Result<Router> {
    let repository = SeaOrmTodoRepository::new(db);
    let service = TodoServiceImpl::new(repository);
    let todo_state = Arc::new(TodoState::new(service));

    let app = Router::new()
        .route("/health", get(health_check_handler))
        .merge(api::create_api_router(todo_state))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)?),
        );
    Ok(app)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let Some(origin) = &config.cors_allowed_origin else {
        return Ok(CorsLayer::permissive());
    };
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    fn config(cors_allowed_origin: Option<&str>) -> Config {
        Config {
            db_url: "postgres://localhost/todos".to_string(),
            port: 8080,
            cors_allowed_origin: cors_allowed_origin.map(str::to_string),
        }
    }

    fn mock_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let app = create_app(mock_db(), &config(None)).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let app = create_app(mock_db(), &config(None)).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn restricts_cors_to_configured_origin() {
        let app = create_app(mock_db(), &config(Some("http://localhost:3000"))).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("http://localhost:3000"))
        );
    }

    #[test]
    fn rejects_unparseable_cors_origin() {
        assert!(cors_layer(&config(Some("bad\norigin"))).is_err());
    }
}

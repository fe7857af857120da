use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::{ApiHandler, ApiOptions};
use crate::auth::AuthGate;
use crate::config::{AppConfig, ModelConfigs, SecurityConfig};
use crate::data::{connect_pool, ClientRegistry, InMemoryStore, PgModelClient};
use crate::error::ApiError;
use crate::handlers;
use crate::hooks::HookRegistry;
use crate::middleware::jwt_auth_middleware;
use crate::schema::introspect::introspect;
use crate::schema::{load_schema_file, Schema};

/// Shared, read-mostly state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub handler: Arc<ApiHandler>,
    pub gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(config: AppConfig, handler: ApiHandler, gate: AuthGate) -> Self {
        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
            gate: Arc::new(gate),
        }
    }
}

/// Build everything the server needs from config.
///
/// With `DATABASE_URL` the schema is introspected (unless a schema file is
/// given) and Postgres clients are used. Without it the schema file is
/// required and records live in memory for the life of the process.
pub async fn bootstrap(config: AppConfig, hooks: HookRegistry) -> anyhow::Result<AppState> {
    let (schema, clients) = match config.database.url.as_deref() {
        Some(_) => {
            let pool = connect_pool(&config.database)
                .await
                .context("Failed to connect to the database")?;
            let schema = match config.sources.schema_path.as_deref() {
                Some(path) => load_schema_file(Some(path))?,
                None => introspect(&pool, &config.database.schema)
                    .await
                    .context("Failed to introspect the database")?,
            };
            let schema = Arc::new(schema);
            let clients = PgModelClient::registry(&pool, &schema, &config.database.schema);
            (schema, clients)
        }
        None => {
            let schema = Arc::new(
                load_schema_file(config.sources.schema_path.as_deref()).context("Failed to load the schema file")?,
            );
            tracing::warn!("DATABASE_URL is not set; records are kept in memory");
            let clients = InMemoryStore::new(Arc::clone(&schema)).client_registry();
            (schema, clients)
        }
    };

    let models = load_model_configs(&config, &schema)?;
    let handler = build_handler(&config, schema, clients, models, hooks);
    let gate = AuthGate::from_config(&config.auth, &config.security).context("Failed to read stored credentials")?;

    Ok(AppState::new(config, handler, gate))
}

fn load_model_configs(config: &AppConfig, schema: &Schema) -> anyhow::Result<ModelConfigs> {
    match config.sources.models_path.as_deref() {
        Some(path) => ModelConfigs::load(schema, path).with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(ModelConfigs::new()),
    }
}

pub fn build_handler(
    config: &AppConfig,
    schema: Arc<Schema>,
    clients: ClientRegistry,
    models: ModelConfigs,
    hooks: HookRegistry,
) -> ApiHandler {
    let options = ApiOptions {
        max_limit: config.query.max_limit,
        data_timeout: Duration::from_secs(config.database.data_timeout_secs),
    };
    tracing::info!(
        "Serving {} models ({} with config, {} hooks)",
        schema.models.len(),
        models.len(),
        hooks.len()
    );
    ApiHandler::new(schema, clients, models, hooks, options)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    serve_on(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    tracing::info!("PRADA API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::public::health_get))
        .nest("/api", api_routes(&state));

    app = match state.config.sources.ui_dir.as_deref() {
        Some(dir) => app.fallback_service(spa_service(dir)),
        None => app.fallback(not_found),
    };

    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state))
        .fallback(not_found)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::*;

    Router::new()
        .route("/setup/status", get(status_get))
        .route("/setup/init", post(init_post))
        .route("/auth/login", post(login_post))
        .route("/auth/logout", post(logout_post))
        .route("/auth/refresh", post(refresh_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::*;

    Router::new()
        .route("/auth/me", get(me_get))
        .route("/schema", get(schema_get))
        // Model-level operations (collection)
        .route("/:model", get(model_get).post(model_post))
        // Record-level operations (individual)
        .route("/:model/:id", get(record_get).put(record_put).delete(record_delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
}

/// Static UI with `index.html` for client-side routes
fn spa_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blog_schema, memory_clients};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn state(config: AppConfig) -> AppState {
        let schema = Arc::new(blog_schema());
        let (_store, clients) = memory_clients(&schema);
        let handler = build_handler(&config, schema, clients, ModelConfigs::new(), HookRegistry::new());
        let gate = AuthGate::from_config(&config.auth, &config.security).unwrap();
        AppState::new(config, handler, gate)
    }

    fn unconfigured(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::development();
        config.auth.config_dir = dir.join(".prada");
        config
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn unknown_api_paths_are_json_404() {
        let tmp = tempfile::tempdir().unwrap();
        let router = build_router(state(unconfigured(tmp.path())));

        let (status, body) = call(router, "/api/a/b/c").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn data_routes_wait_for_setup() {
        let tmp = tempfile::tempdir().unwrap();
        let router = build_router(state(unconfigured(tmp.path())));

        let (status, body) = call(router.clone(), "/api/Post").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "Not configured");

        let (status, body) = call(router, "/api/setup/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["configured"], false);
    }

    #[tokio::test]
    async fn ui_dir_serves_index_for_client_routes() {
        let tmp = tempfile::tempdir().unwrap();
        let ui = tmp.path().join("ui");
        std::fs::create_dir_all(&ui).unwrap();
        std::fs::write(ui.join("index.html"), "<html>admin</html>").unwrap();

        let mut config = unconfigured(tmp.path());
        config.sources.ui_dir = Some(ui);
        let router = build_router(state(config));

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/models/Post").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<html>admin</html>");

        // The API keeps its own 404
        let (status, _) = call(router, "/api/a/b/c").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

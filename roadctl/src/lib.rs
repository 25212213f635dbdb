//! roadctl is a session-authenticated registry of roads and roadworks.
//!
//! The server exposes a REST API over PostgreSQL:
//!
//! - **Authentication** (`/auth/*`): signup, login, logout, profile management, and
//!   administrative account unlock. Logins issue opaque bearer tokens stored server-side;
//!   repeated failed logins lock the account until an administrator unlocks it.
//! - **Roads** (`/roads/*`): CRUD over the road registry, including the roadworks
//!   attached to a road.
//! - **Roadworks** (`/roadworks/*`): CRUD over roadwork projects, one per road.
//!
//! The [`navigation`] module contains the client-side route guard: a pure decision
//! function plus a [`navigation::Navigator`] that resolves auth state asynchronously with
//! cancellation and timeout handling.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐       ┌────────────────┐
//! │  api::handlers │  ───> │  db::handlers  │ ───> PostgreSQL
//! └────────────────┘       └────────────────┘
//!         │
//!         v
//! ┌────────────────┐
//! │  auth::session │  (bearer token issuance/validation)
//! └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let config = Config::load(&args)?;
//! let app = Application::new(config).await?;
//! app.serve(shutdown_signal()).await?;
//! ```

use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod navigation;
pub mod openapi;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

use crate::auth::password;
use crate::config::{Config, CorsOrigin};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::openapi::ApiDoc;
use crate::types::UserId;

/// Shared application state available to all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the roadctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin account on first startup, or refreshes its password and
/// admin flag on subsequent ones. If no password is configured and the account doesn't
/// exist yet, nothing is created (an account without a known password could never log in).
///
/// Returns the admin's user id, or `None` if creation was skipped.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut *tx);

    if let Some(existing) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1, is_admin = TRUE WHERE email = $2")
                .bind(password_hash)
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        return Ok(Some(existing.id));
    }

    let Some(password_hash) = password_hash else {
        warn!("No admin password configured, skipping initial admin creation");
        return Ok(None);
    };

    let created = user_repo
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            password_hash,
            is_admin: true,
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user {}", email);
    Ok(Some(created.id))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard(s) => s.parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![axum::http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes (signup, login, logout, profile, unlock)
/// - Road and roadwork resource routes
/// - Unauthenticated health check
/// - OpenAPI documentation at `/docs`
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route(
            "/auth/profile",
            get(api::handlers::auth::get_profile).put(api::handlers::auth::update_profile),
        )
        .route("/auth/unlock-account/{user_id}", post(api::handlers::auth::unlock_account));

    let road_routes = Router::new()
        .route(
            "/roads",
            get(api::handlers::roads::list_roads).post(api::handlers::roads::create_road),
        )
        .route(
            "/roads/{id}",
            get(api::handlers::roads::get_road)
                .put(api::handlers::roads::update_road)
                .delete(api::handlers::roads::delete_road),
        )
        .route("/roads/{id}/roadworks", get(api::handlers::roads::get_road_roadworks));

    let roadwork_routes = Router::new()
        .route(
            "/roadworks",
            get(api::handlers::roadworks::list_roadworks).post(api::handlers::roadworks::create_roadwork),
        )
        .route(
            "/roadworks/{id}",
            get(api::handlers::roadworks::get_roadwork)
                .put(api::handlers::roadworks::update_roadwork)
                .delete(api::handlers::roadworks::delete_roadwork),
        );

    let router = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "OK"})) }))
        .merge(auth_routes)
        .merge(road_routes)
        .merge(roadwork_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The main application.
///
/// Lifecycle:
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, and
///    bootstraps the initial admin user
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: on the shutdown signal, drains connections and flushes telemetry
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application reusing an existing pool (used by tests)
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        let pool = match pool {
            Some(pool) => pool,
            None => {
                let settings = &config.database.pool;
                PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .min_connections(settings.min_connections)
                    .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout_secs))
                    .connect(&config.database.url)
                    .await?
            }
        };

        migrator().run(&pool).await?;
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("roadctl listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::test_utils::create_test_server;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_health_endpoint_is_public(pool: PgPool) {
        let server = create_test_server(pool).await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_bootstrap_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin@example.com", Some("bootstrap-password"), &pool)
            .await
            .unwrap()
            .unwrap();
        let second = create_initial_admin_user("admin@example.com", Some("rotated-password"), &pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_bootstrap_without_password_skips(pool: PgPool) {
        let result = create_initial_admin_user("admin@example.com", None, &pool).await.unwrap();
        assert!(result.is_none());
    }
}

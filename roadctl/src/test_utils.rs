//! Shared helpers for integration tests.
//!
//! These helpers intentionally use `expect` liberally: a failure here means the test
//! environment itself is broken, not the behavior under test.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::types::UserId;
use crate::{AppState, Application, auth};

/// Password assigned to users created via [`create_test_user`].
pub const TEST_USER_PASSWORD: &str = "test-password-123";

pub fn create_test_config() -> crate::config::Config {
    let mut config = crate::config::Config::default();
    config.port = 0;
    config.admin_password = None;
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}

pub async fn create_test_server(pool: PgPool) -> axum_test::TestServer {
    let app = Application::new_with_pool(create_test_config(), Some(pool))
        .await
        .expect("Failed to create test application");
    app.into_test_server()
}

pub async fn create_test_user(pool: &PgPool, is_admin: bool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let username = format!("testuser_{}", Uuid::new_v4().simple());
    let email = format!("{username}@example.com");

    let user_create = UserCreateDBRequest {
        username,
        email,
        password_hash: auth::password::hash_string(TEST_USER_PASSWORD).expect("Failed to hash test password"),
        is_admin,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_admin(pool: &PgPool) -> UserDBResponse {
    create_test_user(pool, true).await
}

/// Issue a session for the given user and return the bearer secret.
pub async fn issue_test_session(pool: &PgPool, user_id: UserId) -> String {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let session = auth::session::issue_session(&mut conn, user_id, std::time::Duration::from_secs(3600))
        .await
        .expect("Failed to issue test session");
    session.secret
}

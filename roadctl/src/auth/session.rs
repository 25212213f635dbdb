//! Session issuance and validation.
//!
//! Sessions are opaque bearer tokens stored server-side. The token string never encodes
//! any claims, so revoking a session or locking an account takes effect on the very next
//! request.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    api::models::users::CurrentUser,
    auth::password::generate_session_secret,
    db::{
        handlers::{Repository, Sessions, Users},
        models::sessions::{SessionCreateDBRequest, SessionDBResponse},
    },
    errors::{Error, Result},
    types::UserId,
};

/// Issue a new session for a user.
///
/// Returns the stored session; the `secret` field is the bearer token handed to the client.
#[instrument(skip(db), err)]
pub async fn issue_session(db: &mut PgConnection, user_id: UserId, ttl: std::time::Duration) -> Result<SessionDBResponse> {
    let request = SessionCreateDBRequest {
        user_id,
        secret: generate_session_secret(),
        expires_at: Utc::now() + ttl,
    };

    let session = Sessions::new(db).create(&request).await?;
    Ok(session)
}

/// Resolve a bearer token to its user.
///
/// Fails with `Unauthenticated` if the token is unknown, expired, or revoked. Sessions
/// belonging to a locked account fail too, so locking an account invalidates every
/// outstanding token immediately.
#[instrument(skip_all, err)]
pub async fn authenticate_session(db: &mut PgConnection, secret: &str) -> Result<CurrentUser> {
    let session = Sessions::new(db)
        .find_by_secret(secret)
        .await?
        .ok_or(Error::Unauthenticated {
            message: Some("Invalid session token".to_string()),
        })?;

    if !session.is_valid_at(Utc::now()) {
        return Err(Error::Unauthenticated {
            message: Some("Session expired or revoked".to_string()),
        });
    }

    let user = Users::new(db)
        .get_by_id(session.user_id)
        .await?
        .ok_or(Error::Unauthenticated {
            message: Some("Invalid session token".to_string()),
        })?;

    if user.is_locked() {
        return Err(Error::Unauthenticated {
            message: Some("Account is locked".to_string()),
        });
    }

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
        is_admin: user.is_admin,
    })
}

/// Revoke a session by its bearer token. Idempotent.
#[instrument(skip_all, err)]
pub async fn revoke_session(db: &mut PgConnection, secret: &str) -> Result<bool> {
    let revoked = Sessions::new(db).revoke_by_secret(secret).await?;
    Ok(revoked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;
    use std::time::Duration;

    async fn seed_user(conn: &mut PgConnection) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                is_admin: false,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_issue_and_authenticate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let session = issue_session(&mut conn, user_id, Duration::from_secs(3600)).await.unwrap();
        let user = authenticate_session(&mut conn, &session.secret).await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "alice@example.com");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_token_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        seed_user(&mut conn).await;

        let err = authenticate_session(&mut conn, "no-such-token").await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_revoked_token_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let session = issue_session(&mut conn, user_id, Duration::from_secs(3600)).await.unwrap();
        assert!(revoke_session(&mut conn, &session.secret).await.unwrap());
        // Revoking again succeeds without effect
        assert!(!revoke_session(&mut conn, &session.secret).await.unwrap());

        let err = authenticate_session(&mut conn, &session.secret).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_locking_account_invalidates_sessions(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let session = issue_session(&mut conn, user_id, Duration::from_secs(3600)).await.unwrap();
        authenticate_session(&mut conn, &session.secret).await.unwrap();

        // Lock at threshold 1
        Users::new(&mut conn).record_failed_login(user_id, 1).await.unwrap();

        let err = authenticate_session(&mut conn, &session.secret).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        // Unlocking restores the session
        Users::new(&mut conn).unlock(user_id).await.unwrap();
        authenticate_session(&mut conn, &session.secret).await.unwrap();
    }
}

//! Database repository for sessions.
//!
//! Sessions are opaque bearer tokens. The secret is the lookup key; revocation is a soft
//! delete so that a logout leaves an audit trail.

use crate::db::{
    errors::Result,
    models::sessions::{SessionCreateDBRequest, SessionDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct Session {
    pub id: Uuid,
    pub user_id: UserId,
    pub secret: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionDBResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            secret: s.secret,
            issued_at: s.issued_at,
            expires_at: s.expires_at,
            revoked_at: s.revoked_at,
        }
    }
}

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, secret, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.secret)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session.into())
    }

    /// Look up a session by its secret. Returns revoked and expired sessions too; validity
    /// is the caller's call via [`SessionDBResponse::is_valid_at`].
    #[instrument(skip_all, err)]
    pub async fn find_by_secret(&mut self, secret: &str) -> Result<Option<SessionDBResponse>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE secret = $1")
            .bind(secret)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session.map(Into::into))
    }

    /// Revoke a session by secret. Idempotent: revoking an already-revoked or unknown
    /// secret succeeds and returns false.
    #[instrument(skip_all, err)]
    pub async fn revoke_by_secret(&mut self, secret: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE secret = $1 AND revoked_at IS NULL")
            .bind(secret)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session belonging to a user.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn revoke_all_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

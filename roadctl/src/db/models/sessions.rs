//! Database models for sessions.

use crate::types::{SessionId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub user_id: UserId,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

/// Database response for a session
#[derive(Debug, Clone)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub secret: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionDBResponse {
    /// Whether this session can still authenticate requests at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

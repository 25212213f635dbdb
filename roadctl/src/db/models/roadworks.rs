//! Database models for roadworks.

use crate::api::models::roadworks::{RoadworkCreate, RoadworkUpdate};
use crate::types::{RoadId, RoadworkId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for creating a new roadwork
#[derive(Debug, Clone)]
pub struct RoadworkCreateDBRequest {
    pub road_id: RoadId,
    pub budget: Decimal,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<RoadworkCreate> for RoadworkCreateDBRequest {
    fn from(api: RoadworkCreate) -> Self {
        Self {
            road_id: api.road_id,
            budget: api.budget,
            status: api.status,
            finished_at: api.finished_at,
        }
    }
}

/// Database request for updating a roadwork
///
/// `finished_at` uses a double Option: outer `None` leaves the column unchanged,
/// `Some(None)` clears it back to unfinished.
#[derive(Debug, Clone, Default)]
pub struct RoadworkUpdateDBRequest {
    pub budget: Option<Decimal>,
    pub status: Option<String>,
    pub finished_at: Option<Option<DateTime<Utc>>>,
}

impl From<RoadworkUpdate> for RoadworkUpdateDBRequest {
    fn from(api: RoadworkUpdate) -> Self {
        Self {
            budget: api.budget,
            status: api.status,
            finished_at: api.finished_at,
        }
    }
}

/// Database response for a roadwork
#[derive(Debug, Clone)]
pub struct RoadworkDBResponse {
    pub id: RoadworkId,
    pub road_id: RoadId,
    pub budget: Decimal,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

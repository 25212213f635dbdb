//! API models for roadworks.

use crate::db::models::roadworks::RoadworkDBResponse;
use crate::types::{RoadId, RoadworkId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for opening a roadwork on a road
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoadworkCreate {
    #[schema(value_type = Uuid)]
    pub road_id: RoadId,
    /// Allocated budget, two decimal places
    #[schema(value_type = String, example = "150000.50")]
    pub budget: Decimal,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Request body for updating a roadwork; omitted fields are left unchanged.
///
/// `finished_at` distinguishes "not sent" from an explicit `null`: sending `null` clears
/// the finish date back to unfinished.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoadworkUpdate {
    #[schema(value_type = Option<String>)]
    pub budget: Option<Decimal>,
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<Option<String>>)]
    pub finished_at: Option<Option<DateTime<Utc>>>,
}

/// A roadwork record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoadworkResponse {
    #[schema(value_type = Uuid)]
    pub id: RoadworkId,
    #[schema(value_type = Uuid)]
    pub road_id: RoadId,
    #[schema(value_type = String)]
    pub budget: Decimal,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoadworkDBResponse> for RoadworkResponse {
    fn from(rw: RoadworkDBResponse) -> Self {
        Self {
            id: rw.id,
            road_id: rw.road_id,
            budget: rw.budget,
            status: rw.status,
            finished_at: rw.finished_at,
            created_at: rw.created_at,
            updated_at: rw.updated_at,
        }
    }
}

/// Query parameters for listing roadworks
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct RoadworkListParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Only return roadworks in this status
    #[serde(default)]
    pub status: Option<String>,
}

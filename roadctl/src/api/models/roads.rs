//! API models for roads.

use crate::db::models::roads::RoadDBResponse;
use crate::types::RoadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for registering a road
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoadCreate {
    /// Road designation, e.g. "A1"
    pub designation: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Administrative area the road belongs to
    pub area: String,
}

/// Request body for updating a road; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoadUpdate {
    pub designation: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub area: Option<String>,
}

/// A road record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoadResponse {
    #[schema(value_type = Uuid)]
    pub id: RoadId,
    pub designation: String,
    pub longitude: f64,
    pub latitude: f64,
    pub area: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoadDBResponse> for RoadResponse {
    fn from(road: RoadDBResponse) -> Self {
        Self {
            id: road.id,
            designation: road.designation,
            longitude: road.longitude,
            latitude: road.latitude,
            area: road.area,
            created_at: road.created_at,
            updated_at: road.updated_at,
        }
    }
}

/// Query parameters for listing roads
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct RoadListParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Only return roads in this area
    #[serde(default)]
    pub area: Option<String>,
}

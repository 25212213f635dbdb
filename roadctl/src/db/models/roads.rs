//! Database models for roads.

use crate::api::models::roads::{RoadCreate, RoadUpdate};
use crate::types::RoadId;
use chrono::{DateTime, Utc};

/// Database request for creating a new road
#[derive(Debug, Clone)]
pub struct RoadCreateDBRequest {
    pub designation: String,
    pub longitude: f64,
    pub latitude: f64,
    pub area: String,
}

impl From<RoadCreate> for RoadCreateDBRequest {
    fn from(api: RoadCreate) -> Self {
        Self {
            designation: api.designation,
            longitude: api.longitude,
            latitude: api.latitude,
            area: api.area,
        }
    }
}

/// Database request for updating a road
#[derive(Debug, Clone, Default)]
pub struct RoadUpdateDBRequest {
    pub designation: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub area: Option<String>,
}

impl From<RoadUpdate> for RoadUpdateDBRequest {
    fn from(api: RoadUpdate) -> Self {
        Self {
            designation: api.designation,
            longitude: api.longitude,
            latitude: api.latitude,
            area: api.area,
        }
    }
}

/// Database response for a road
#[derive(Debug, Clone)]
pub struct RoadDBResponse {
    pub id: RoadId,
    pub designation: String,
    pub longitude: f64,
    pub latitude: f64,
    pub area: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

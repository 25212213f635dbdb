//! Database repository for roads.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::roads::{RoadCreateDBRequest, RoadDBResponse, RoadUpdateDBRequest},
};
use crate::types::{RoadId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing roads
#[derive(Debug, Clone)]
pub struct RoadFilter {
    pub skip: i64,
    pub limit: i64,
    /// Only return roads in this area when set
    pub area: Option<String>,
}

impl RoadFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, area: None }
    }

    pub fn in_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Road {
    pub id: RoadId,
    pub designation: String,
    pub longitude: f64,
    pub latitude: f64,
    pub area: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Road> for RoadDBResponse {
    fn from(road: Road) -> Self {
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

pub struct Roads<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Roads<'c> {
    type CreateRequest = RoadCreateDBRequest;
    type UpdateRequest = RoadUpdateDBRequest;
    type Response = RoadDBResponse;
    type Id = RoadId;
    type Filter = RoadFilter;

    #[instrument(skip(self, request), fields(designation = %request.designation), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let road = sqlx::query_as::<_, Road>(
            r#"
            INSERT INTO roads (id, designation, longitude, latitude, area)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.designation)
        .bind(request.longitude)
        .bind(request.latitude)
        .bind(&request.area)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(road.into())
    }

    #[instrument(skip(self), fields(road_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let road = sqlx::query_as::<_, Road>("SELECT * FROM roads WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(road.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<RoadId>) -> Result<HashMap<Self::Id, RoadDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let roads = sqlx::query_as::<_, Road>("SELECT * FROM roads WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roads.into_iter().map(|r| (r.id, r.into())).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let roads = sqlx::query_as::<_, Road>(
            r#"
            SELECT * FROM roads
            WHERE ($3::text IS NULL OR area = $3)
            ORDER BY designation ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .bind(&filter.area)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(roads.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(road_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roads WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(road_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let road = sqlx::query_as::<_, Road>(
            r#"
            UPDATE roads SET
                designation = COALESCE($2, designation),
                longitude = COALESCE($3, longitude),
                latitude = COALESCE($4, latitude),
                area = COALESCE($5, area),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.designation)
        .bind(request.longitude)
        .bind(request.latitude)
        .bind(&request.area)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(road.into())
    }
}

impl<'c> Roads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

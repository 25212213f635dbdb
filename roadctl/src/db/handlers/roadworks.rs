//! Database repository for roadworks.
//!
//! A road has at most one roadwork (enforced by a unique constraint on road_id).

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::roadworks::{RoadworkCreateDBRequest, RoadworkDBResponse, RoadworkUpdateDBRequest},
};
use crate::types::{RoadId, RoadworkId, abbrev_uuid};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing roadworks
#[derive(Debug, Clone)]
pub struct RoadworkFilter {
    pub skip: i64,
    pub limit: i64,
    /// Only return roadworks in this status when set
    pub status: Option<String>,
}

impl RoadworkFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, status: None }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Roadwork {
    pub id: RoadworkId,
    pub road_id: RoadId,
    pub budget: Decimal,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Roadwork> for RoadworkDBResponse {
    fn from(rw: Roadwork) -> Self {
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

pub struct Roadworks<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Roadworks<'c> {
    type CreateRequest = RoadworkCreateDBRequest;
    type UpdateRequest = RoadworkUpdateDBRequest;
    type Response = RoadworkDBResponse;
    type Id = RoadworkId;
    type Filter = RoadworkFilter;

    #[instrument(skip(self, request), fields(road_id = %abbrev_uuid(&request.road_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let roadwork = sqlx::query_as::<_, Roadwork>(
            r#"
            INSERT INTO roadworks (id, road_id, budget, status, finished_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.road_id)
        .bind(request.budget)
        .bind(&request.status)
        .bind(request.finished_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(roadwork.into())
    }

    #[instrument(skip(self), fields(roadwork_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let roadwork = sqlx::query_as::<_, Roadwork>("SELECT * FROM roadworks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(roadwork.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<RoadworkId>) -> Result<HashMap<Self::Id, RoadworkDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let roadworks = sqlx::query_as::<_, Roadwork>("SELECT * FROM roadworks WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roadworks.into_iter().map(|r| (r.id, r.into())).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let roadworks = sqlx::query_as::<_, Roadwork>(
            r#"
            SELECT * FROM roadworks
            WHERE ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .bind(&filter.status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(roadworks.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(roadwork_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roadworks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(roadwork_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // finished_at uses a sentinel flag since NULL is a meaningful value for it
        let roadwork = sqlx::query_as::<_, Roadwork>(
            r#"
            UPDATE roadworks SET
                budget = COALESCE($2, budget),
                status = COALESCE($3, status),
                finished_at = CASE WHEN $4 THEN $5 ELSE finished_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.budget)
        .bind(&request.status)
        .bind(request.finished_at.is_some())
        .bind(request.finished_at.flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(roadwork.into())
    }
}

impl<'c> Roadworks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(road_id = %abbrev_uuid(&road_id)), err)]
    pub async fn get_by_road_id(&mut self, road_id: RoadId) -> Result<Option<RoadworkDBResponse>> {
        let roadwork = sqlx::query_as::<_, Roadwork>("SELECT * FROM roadworks WHERE road_id = $1")
            .bind(road_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(roadwork.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::db::handlers::roads::Roads;
    use crate::db::models::roads::RoadCreateDBRequest;
    use rust_decimal::prelude::FromPrimitive;
    use sqlx::PgPool;

    async fn seed_road(conn: &mut PgConnection, designation: &str) -> RoadId {
        let mut roads = Roads::new(conn);
        roads
            .create(&RoadCreateDBRequest {
                designation: designation.to_string(),
                longitude: -8.61,
                latitude: 41.15,
                area: "north".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn create_request(road_id: RoadId, status: &str) -> RoadworkCreateDBRequest {
        RoadworkCreateDBRequest {
            road_id,
            budget: Decimal::from_f64(150_000.50).unwrap(),
            status: status.to_string(),
            finished_at: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_by_road(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let road_id = seed_road(&mut conn, "A1").await;

        let mut repo = Roadworks::new(&mut conn);
        let created = repo.create(&create_request(road_id, "in_progress")).await.unwrap();
        assert_eq!(created.road_id, road_id);
        assert!(created.finished_at.is_none());

        let by_road = repo.get_by_road_id(road_id).await.unwrap().unwrap();
        assert_eq!(by_road.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_second_roadwork_on_road_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let road_id = seed_road(&mut conn, "A1").await;

        let mut repo = Roadworks::new(&mut conn);
        repo.create(&create_request(road_id, "planned")).await.unwrap();
        let err = repo.create(&create_request(road_id, "planned")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("roadworks_road_id_unique"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_road_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roadworks::new(&mut conn);

        let err = repo.create(&create_request(Uuid::new_v4(), "planned")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_finished_at_sentinel(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let road_id = seed_road(&mut conn, "A1").await;

        let mut repo = Roadworks::new(&mut conn);
        let created = repo.create(&create_request(road_id, "in_progress")).await.unwrap();

        // Outer None leaves finished_at alone
        let updated = repo
            .update(
                created.id,
                &RoadworkUpdateDBRequest {
                    status: Some("finished".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "finished");
        assert!(updated.finished_at.is_none());

        // Some(Some(ts)) sets it
        let ts = Utc::now();
        let updated = repo
            .update(
                created.id,
                &RoadworkUpdateDBRequest {
                    finished_at: Some(Some(ts)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.finished_at.is_some());

        // Some(None) clears it
        let updated = repo
            .update(
                created.id,
                &RoadworkUpdateDBRequest {
                    finished_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.finished_at.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_road_cascades(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let road_id = seed_road(&mut conn, "A1").await;

        let created = {
            let mut repo = Roadworks::new(&mut conn);
            repo.create(&create_request(road_id, "planned")).await.unwrap()
        };

        {
            let mut roads = Roads::new(&mut conn);
            assert!(roads.delete(road_id).await.unwrap());
        }

        let mut repo = Roadworks::new(&mut conn);
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}

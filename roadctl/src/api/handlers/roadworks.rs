//! Roadwork endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;

use crate::{
    AppState,
    api::models::{
        roadworks::{RoadworkCreate, RoadworkListParams, RoadworkResponse, RoadworkUpdate},
        users::CurrentUser,
    },
    db::handlers::{Repository, Roadworks, roadworks::RoadworkFilter},
    errors::Error,
    types::RoadworkId,
};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// List roadworks
#[utoipa::path(
    get,
    path = "/roadworks",
    params(RoadworkListParams),
    tag = "roadworks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roadworks", body = Vec<RoadworkResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_roadworks(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<RoadworkListParams>,
) -> Result<Json<Vec<RoadworkResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut filter = RoadworkFilter::new(params.skip.unwrap_or(0), params.limit.unwrap_or(DEFAULT_PAGE_SIZE));
    if let Some(status) = params.status {
        filter = filter.with_status(status);
    }

    let roadworks = Roadworks::new(&mut conn).list(&filter).await?;
    Ok(Json(roadworks.into_iter().map(Into::into).collect()))
}

/// Open a roadwork on a road
#[utoipa::path(
    post,
    path = "/roadworks",
    request_body = RoadworkCreate,
    tag = "roadworks",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Roadwork created", body = RoadworkResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Road already has a roadwork"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_roadwork(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<RoadworkCreate>,
) -> Result<(StatusCode, Json<RoadworkResponse>), Error> {
    validate_budget(request.budget)?;
    validate_status(&request.status)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let roadwork = Roadworks::new(&mut conn).create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(roadwork.into())))
}

/// Get a roadwork by id
#[utoipa::path(
    get,
    path = "/roadworks/{id}",
    params(("id" = uuid::Uuid, Path, description = "Roadwork id")),
    tag = "roadworks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roadwork", body = RoadworkResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such roadwork"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_roadwork(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RoadworkId>,
) -> Result<Json<RoadworkResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let roadwork = Roadworks::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "roadwork".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(roadwork.into()))
}

/// Update a roadwork
#[utoipa::path(
    put,
    path = "/roadworks/{id}",
    params(("id" = uuid::Uuid, Path, description = "Roadwork id")),
    request_body = RoadworkUpdate,
    tag = "roadworks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roadwork updated", body = RoadworkResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such roadwork"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_roadwork(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RoadworkId>,
    Json(request): Json<RoadworkUpdate>,
) -> Result<Json<RoadworkResponse>, Error> {
    if let Some(budget) = request.budget {
        validate_budget(budget)?;
    }
    if let Some(status) = &request.status {
        validate_status(status)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let roadwork = Roadworks::new(&mut conn).update(id, &request.into()).await?;

    Ok(Json(roadwork.into()))
}

/// Delete a roadwork
#[utoipa::path(
    delete,
    path = "/roadworks/{id}",
    params(("id" = uuid::Uuid, Path, description = "Roadwork id")),
    tag = "roadworks",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Roadwork deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such roadwork"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_roadwork(State(state): State<AppState>, _user: CurrentUser, Path(id): Path<RoadworkId>) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Roadworks::new(&mut conn).delete(id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "roadwork".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_budget(budget: Decimal) -> Result<(), Error> {
    if budget < Decimal::ZERO {
        return Err(Error::Validation {
            message: "Budget must not be negative".to_string(),
        });
    }
    Ok(())
}

fn validate_status(status: &str) -> Result<(), Error> {
    if status.trim().is_empty() {
        return Err(Error::Validation {
            message: "Status must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_server, create_test_user, issue_test_session};
    use serde_json::json;
    use sqlx::PgPool;

    async fn authed_server(pool: PgPool) -> (axum_test::TestServer, String) {
        let server = create_test_server(pool.clone()).await;
        let user = create_test_user(&pool, false).await;
        let token = issue_test_session(&pool, user.id).await;
        (server, format!("Bearer {token}"))
    }

    async fn seed_road(server: &axum_test::TestServer, auth: &str, designation: &str) -> String {
        let road: serde_json::Value = server
            .post("/roads")
            .authorization(auth)
            .json(&json!({
                "designation": designation,
                "longitude": -8.61,
                "latitude": 41.15,
                "area": "north"
            }))
            .await
            .json();
        road["id"].as_str().unwrap().to_string()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_roadwork_crud_roundtrip(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;
        let road_id = seed_road(&server, &auth, "A1").await;

        let created = server
            .post("/roadworks")
            .authorization(&auth)
            .json(&json!({
                "road_id": road_id,
                "budget": "150000.50",
                "status": "planned",
                "finished_at": null
            }))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let roadwork: serde_json::Value = created.json();
        let id = roadwork["id"].as_str().unwrap().to_string();
        assert_eq!(roadwork["budget"], "150000.50");

        let updated = server
            .put(&format!("/roadworks/{id}"))
            .authorization(&auth)
            .json(&json!({"status": "in_progress"}))
            .await;
        updated.assert_status_ok();
        let updated: serde_json::Value = updated.json();
        assert_eq!(updated["status"], "in_progress");
        assert_eq!(updated["budget"], "150000.50");

        server
            .delete(&format!("/roadworks/{id}"))
            .authorization(&auth)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        server
            .get(&format!("/roadworks/{id}"))
            .authorization(&auth)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_roadwork_on_road_conflicts(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;
        let road_id = seed_road(&server, &auth, "A1").await;

        let payload = json!({
            "road_id": road_id,
            "budget": "1000.00",
            "status": "planned",
            "finished_at": null
        });
        server
            .post("/roadworks")
            .authorization(&auth)
            .json(&payload)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server.post("/roadworks").authorization(&auth).json(&payload).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "duplicate_identity");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_budget_rejected(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;
        let road_id = seed_road(&server, &auth, "A1").await;

        let response = server
            .post("/roadworks")
            .authorization(&auth)
            .json(&json!({
                "road_id": road_id,
                "budget": "-5.00",
                "status": "planned",
                "finished_at": null
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_roadworks_by_status(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;

        for (designation, status) in [("A1", "planned"), ("A2", "in_progress"), ("A3", "planned")] {
            let road_id = seed_road(&server, &auth, designation).await;
            server
                .post("/roadworks")
                .authorization(&auth)
                .json(&json!({
                    "road_id": road_id,
                    "budget": "1000.00",
                    "status": status,
                    "finished_at": null
                }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let all: Vec<serde_json::Value> = server.get("/roadworks").authorization(&auth).await.json();
        assert_eq!(all.len(), 3);

        let planned: Vec<serde_json::Value> = server.get("/roadworks?status=planned").authorization(&auth).await.json();
        assert_eq!(planned.len(), 2);
    }
}

//! Road registry endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        roads::{RoadCreate, RoadListParams, RoadResponse, RoadUpdate},
        roadworks::RoadworkResponse,
        users::CurrentUser,
    },
    db::handlers::{Repository, Roads, Roadworks, roads::RoadFilter},
    errors::Error,
    types::RoadId,
};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// List roads
#[utoipa::path(
    get,
    path = "/roads",
    params(RoadListParams),
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roads", body = Vec<RoadResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_roads(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<RoadListParams>,
) -> Result<Json<Vec<RoadResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut filter = RoadFilter::new(params.skip.unwrap_or(0), params.limit.unwrap_or(DEFAULT_PAGE_SIZE));
    if let Some(area) = params.area {
        filter = filter.in_area(area);
    }

    let roads = Roads::new(&mut conn).list(&filter).await?;
    Ok(Json(roads.into_iter().map(Into::into).collect()))
}

/// Register a new road
#[utoipa::path(
    post,
    path = "/roads",
    request_body = RoadCreate,
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Road created", body = RoadResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_road(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<RoadCreate>,
) -> Result<(StatusCode, Json<RoadResponse>), Error> {
    validate_road_fields(&request.designation, request.longitude, request.latitude)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let road = Roads::new(&mut conn).create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(road.into())))
}

/// Get a road by id
#[utoipa::path(
    get,
    path = "/roads/{id}",
    params(("id" = uuid::Uuid, Path, description = "Road id")),
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Road", body = RoadResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such road"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_road(State(state): State<AppState>, _user: CurrentUser, Path(id): Path<RoadId>) -> Result<Json<RoadResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let road = Roads::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "road".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(road.into()))
}

/// Update a road
#[utoipa::path(
    put,
    path = "/roads/{id}",
    params(("id" = uuid::Uuid, Path, description = "Road id")),
    request_body = RoadUpdate,
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Road updated", body = RoadResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such road"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_road(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RoadId>,
    Json(request): Json<RoadUpdate>,
) -> Result<Json<RoadResponse>, Error> {
    if let Some(designation) = &request.designation
        && designation.trim().is_empty()
    {
        return Err(Error::Validation {
            message: "Designation must not be empty".to_string(),
        });
    }
    validate_coordinates(request.longitude, request.latitude)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let road = Roads::new(&mut conn).update(id, &request.into()).await?;

    Ok(Json(road.into()))
}

/// Delete a road
#[utoipa::path(
    delete,
    path = "/roads/{id}",
    params(("id" = uuid::Uuid, Path, description = "Road id")),
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Road deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such road"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_road(State(state): State<AppState>, _user: CurrentUser, Path(id): Path<RoadId>) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Roads::new(&mut conn).delete(id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "road".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Get the roadwork attached to a road, if any
#[utoipa::path(
    get,
    path = "/roads/{id}/roadworks",
    params(("id" = uuid::Uuid, Path, description = "Road id")),
    tag = "roads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roadworks for the road", body = Vec<RoadworkResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such road"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_road_roadworks(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RoadId>,
) -> Result<Json<Vec<RoadworkResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // 404 for unknown roads, empty list for roads without roadworks
    Roads::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "road".to_string(),
        id: id.to_string(),
    })?;

    let roadwork = Roadworks::new(&mut conn).get_by_road_id(id).await?;
    Ok(Json(roadwork.into_iter().map(Into::into).collect()))
}

fn validate_road_fields(designation: &str, longitude: f64, latitude: f64) -> Result<(), Error> {
    if designation.trim().is_empty() {
        return Err(Error::Validation {
            message: "Designation must not be empty".to_string(),
        });
    }
    validate_coordinates(Some(longitude), Some(latitude))
}

fn validate_coordinates(longitude: Option<f64>, latitude: Option<f64>) -> Result<(), Error> {
    if let Some(longitude) = longitude
        && !(-180.0..=180.0).contains(&longitude)
    {
        return Err(Error::Validation {
            message: "Longitude must be between -180 and 180".to_string(),
        });
    }
    if let Some(latitude) = latitude
        && !(-90.0..=90.0).contains(&latitude)
    {
        return Err(Error::Validation {
            message: "Latitude must be between -90 and 90".to_string(),
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

    fn road_payload(designation: &str) -> serde_json::Value {
        json!({
            "designation": designation,
            "longitude": -8.61,
            "latitude": 41.15,
            "area": "north"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_roads_require_authentication(pool: PgPool) {
        let server = create_test_server(pool).await;

        server.get("/roads").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
        server
            .post("/roads")
            .json(&road_payload("A1"))
            .await
            .assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_road_crud_roundtrip(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;

        let created = server.post("/roads").authorization(&auth).json(&road_payload("A1")).await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let road: serde_json::Value = created.json();
        let id = road["id"].as_str().unwrap().to_string();

        let fetched: serde_json::Value = server.get(&format!("/roads/{id}")).authorization(&auth).await.json();
        assert_eq!(fetched["designation"], "A1");

        let updated = server
            .put(&format!("/roads/{id}"))
            .authorization(&auth)
            .json(&json!({"area": "south"}))
            .await;
        updated.assert_status_ok();
        let updated: serde_json::Value = updated.json();
        assert_eq!(updated["area"], "south");
        assert_eq!(updated["designation"], "A1");

        server
            .delete(&format!("/roads/{id}"))
            .authorization(&auth)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        server
            .get(&format!("/roads/{id}"))
            .authorization(&auth)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_roads_with_area_filter(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;

        for (designation, area) in [("A1", "north"), ("A2", "south"), ("A3", "north")] {
            server
                .post("/roads")
                .authorization(&auth)
                .json(&json!({
                    "designation": designation,
                    "longitude": -8.61,
                    "latitude": 41.15,
                    "area": area
                }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let all: Vec<serde_json::Value> = server.get("/roads").authorization(&auth).await.json();
        assert_eq!(all.len(), 3);

        let north: Vec<serde_json::Value> = server.get("/roads?area=north").authorization(&auth).await.json();
        assert_eq!(north.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_road_rejects_bad_coordinates(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;

        let response = server
            .post("/roads")
            .authorization(&auth)
            .json(&json!({
                "designation": "A1",
                "longitude": 200.0,
                "latitude": 41.15,
                "area": "north"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_road_roadworks_subresource(pool: PgPool) {
        let (server, auth) = authed_server(pool).await;

        let road: serde_json::Value = server.post("/roads").authorization(&auth).json(&road_payload("A1")).await.json();
        let road_id = road["id"].as_str().unwrap().to_string();

        // Road exists but has no roadworks yet
        let empty: Vec<serde_json::Value> = server
            .get(&format!("/roads/{road_id}/roadworks"))
            .authorization(&auth)
            .await
            .json();
        assert!(empty.is_empty());

        server
            .post("/roadworks")
            .authorization(&auth)
            .json(&json!({
                "road_id": road_id,
                "budget": "150000.50",
                "status": "in_progress",
                "finished_at": null
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let works: Vec<serde_json::Value> = server
            .get(&format!("/roads/{road_id}/roadworks"))
            .authorization(&auth)
            .await
            .json();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0]["road_id"].as_str().unwrap(), road_id);

        // Unknown road is a 404, not an empty list
        server
            .get(&format!("/roads/{}/roadworks", uuid::Uuid::new_v4()))
            .authorization(&auth)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}

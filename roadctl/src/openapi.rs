//! OpenAPI documentation configuration.
//!
//! Aggregates the path and schema annotations from the handler modules into a single
//! document, served at `/docs` via Scalar.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("Session token")
                        .description(Some(
                            "Session token authentication. Obtain a token via `POST /auth/login` \
                            and include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "roadctl API",
        description = "Session-authenticated registry of roads and roadworks."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::get_profile,
        api::handlers::auth::update_profile,
        api::handlers::auth::unlock_account,
        api::handlers::roads::list_roads,
        api::handlers::roads::create_road,
        api::handlers::roads::get_road,
        api::handlers::roads::update_road,
        api::handlers::roads::delete_road,
        api::handlers::roads::get_road_roadworks,
        api::handlers::roadworks::list_roadworks,
        api::handlers::roadworks::create_roadwork,
        api::handlers::roadworks::get_roadwork,
        api::handlers::roadworks::update_roadwork,
        api::handlers::roadworks::delete_roadwork,
    ),
    components(schemas(
        api::models::auth::SignupRequest,
        api::models::auth::SignupResponse,
        api::models::auth::LoginRequest,
        api::models::auth::LoginResponse,
        api::models::auth::LogoutResponse,
        api::models::auth::UnlockAccountResponse,
        api::models::users::CurrentUser,
        api::models::users::UserResponse,
        api::models::users::ProfileUpdateRequest,
        api::models::roads::RoadCreate,
        api::models::roads::RoadUpdate,
        api::models::roads::RoadResponse,
        api::models::roadworks::RoadworkCreate,
        api::models::roadworks::RoadworkUpdate,
        api::models::roadworks::RoadworkResponse,
    )),
    tags(
        (name = "auth", description = "Authentication and account lifecycle"),
        (name = "roads", description = "Road registry"),
        (name = "roadworks", description = "Roadworks attached to roads"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("serializable document");
        assert!(json.contains("/auth/login"));
        assert!(json.contains("/roads/{id}/roadworks"));
        assert!(json.contains("bearer_auth"));
    }
}

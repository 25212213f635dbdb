//! API request/response models.
//!
//! These types define the JSON wire format of the HTTP API. They derive `ToSchema` so the
//! OpenAPI document stays in sync with the code.

pub mod auth;
pub mod roads;
pub mod roadworks;
pub mod users;

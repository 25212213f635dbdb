//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Signup, login, logout, profile, and account unlock
//! - [`roads`]: Road registry CRUD
//! - [`roadworks`]: Roadwork CRUD
//!
//! # Authentication
//!
//! Protected handlers take a [`crate::api::models::users::CurrentUser`] argument, which
//! rejects requests without a valid bearer token.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod auth;
pub mod roads;
pub mod roadworks;

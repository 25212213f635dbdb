//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides strongly-typed CRUD
//! operations, and returns domain models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and authentication
//! - [`Sessions`]: Session token lifecycle
//! - [`Roads`]: Road registry
//! - [`Roadworks`]: Roadwork projects attached to roads

pub mod repository;
pub mod roads;
pub mod roadworks;
pub mod sessions;
pub mod users;

pub use repository::Repository;
pub use roads::Roads;
pub use roadworks::Roadworks;
pub use sessions::Sessions;
pub use users::Users;

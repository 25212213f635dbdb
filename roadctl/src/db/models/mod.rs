//! Database models.
//!
//! These are the request/response types used by the repository layer. They are deliberately
//! separate from the API models so that API changes don't leak into SQL and vice versa.

pub mod roads;
pub mod roadworks;
pub mod sessions;
pub mod users;

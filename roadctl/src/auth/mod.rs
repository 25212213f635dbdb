//! Authentication and authorization system.
//!
//! # Authentication
//!
//! Clients authenticate with opaque bearer tokens issued at login:
//! - Users log in via `/auth/login` with email/password
//! - The token is passed in an `Authorization: Bearer <token>` header
//! - Tokens are stored server-side, so logout and account lockout take effect immediately
//!
//! # Authorization
//!
//! Most routes only require a valid session. Administrative operations (unlocking
//! accounts) additionally require the `is_admin` flag.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Session issuance, validation, and revocation
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use roadctl::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;

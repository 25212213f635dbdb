//! Authentication endpoints: signup, login, logout, profile, and account unlock.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{
    AppState,
    api::models::{
        auth::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest, SignupResponse, UnlockAccountResponse},
        users::{CurrentUser, ProfileUpdateRequest, UserResponse},
    },
    auth::{current_user::require_admin, password, session},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
};

/// Validate a password against the configured length rules.
fn validate_password(password: &str, config: &crate::config::PasswordConfig) -> Result<(), Error> {
    if password.len() < config.min_length {
        return Err(Error::Validation {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if password.len() > config.max_length {
        return Err(Error::Validation {
            message: format!("Password must be no more than {} characters", config.max_length),
        });
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), Error> {
    if username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), Error> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(Error::Validation {
            message: "A valid email address is required".to_string(),
        });
    }
    Ok(())
}

/// Hash a password on a blocking thread to avoid stalling the async runtime.
async fn hash_password_blocking(password: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    tag = "auth",
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<(StatusCode, Json<SignupResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::Validation {
            message: "User registration is disabled".to_string(),
        });
    }

    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password, &state.config.auth.password)?;

    let password_hash = hash_password_blocking(request.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // The unique constraints on username and email are the source of truth for duplicates;
    // a racing insert surfaces as a 409 via the DbError mapping.
    let created = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            is_admin: false,
        })
        .await?;

    // No session is issued here; the new account logs in explicitly.
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: created.into(),
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 423, description = "Account locked"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // The same error is returned whether the email is unknown or the password is wrong,
    // so responses don't reveal which accounts exist.
    let user = user_repo
        .get_user_by_email(&request.email)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if user.is_locked() {
        return Err(Error::AccountLocked);
    }

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        let max_attempts = state.config.auth.lockout.max_failed_attempts;
        let updated = user_repo.record_failed_login(user.id, max_attempts).await?;
        if updated.is_locked() {
            return Err(Error::AccountLocked);
        }
        return Err(Error::InvalidCredentials);
    }

    let user = user_repo.record_successful_login(user.id).await?;
    let session = session::issue_session(&mut conn, user.id, state.config.auth.session.timeout).await?;

    Ok(Json(LoginResponse {
        token: session.secret,
        expires_at: session.expires_at,
        user: user.into(),
    }))
}

/// Logout the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session revoked", body = LogoutResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<LogoutResponse>, Error> {
    // Logout is idempotent: revoking a missing, expired, or already-revoked token still
    // reports success so clients can always clear local state.
    if let Some(secret) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        session::revoke_session(&mut conn, secret).await?;
    }

    Ok(Json(LogoutResponse {
        message: "Logged out".to_string(),
    }))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let full = Users::new(&mut conn)
        .get_by_id(user.id)
        .await?
        .ok_or(Error::NotFound {
            resource: "user".to_string(),
            id: user.id.to_string(),
        })?;

    Ok(Json(full.into()))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = ProfileUpdateRequest,
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, Error> {
    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let password_hash = match request.password {
        Some(password) => {
            validate_password(&password, &state.config.auth.password)?;
            Some(hash_password_blocking(password).await?)
        }
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let updated = Users::new(&mut conn)
        .update(
            user.id,
            &UserUpdateDBRequest {
                username: request.username,
                email: request.email,
                password_hash,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Unlock a locked account (admin only)
#[utoipa::path(
    post,
    path = "/auth/unlock-account/{user_id}",
    params(("user_id" = uuid::Uuid, Path, description = "Account to unlock")),
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account unlocked", body = UnlockAccountResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "No such account"),
    )
)]
#[tracing::instrument(skip_all, fields(admin_id = %user.id))]
pub async fn unlock_account(
    State(state): State<AppState>,
    user: CurrentUser,
    axum::extract::Path(user_id): axum::extract::Path<crate::types::UserId>,
) -> Result<Json<UnlockAccountResponse>, Error> {
    require_admin(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Unlocking an already-unlocked account is a no-op, not an error
    let unlocked = user_repo.unlock(user_id).await.map_err(|e| match e {
        crate::db::errors::DbError::NotFound => Error::NotFound {
            resource: "user".to_string(),
            id: user_id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(UnlockAccountResponse {
        user: unlocked.into(),
        message: "Account unlocked".to_string(),
    }))
}

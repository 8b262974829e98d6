//! Authentication handlers: registration, login, current user
//!
//! Login failures are a single generic `InvalidCredentials` regardless of
//! whether the name was unknown or the password wrong, so the endpoint
//! cannot be used to enumerate usernames.

use axum::{extract::State, http::StatusCode, Extension, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::common::{ApiResponse, ValidatedJson};
use crate::api::ApiContext;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::CurrentUser;
use crate::db::entities::user;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "name must be 3-50 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Wire contract for a successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserInfo>),
        (status = 409, description = "Name or email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(ctx): State<ApiContext>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let existing = user::Entity::find()
        .filter(
            user::Column::Name
                .eq(&request.name)
                .or(user::Column::Email.eq(&request.email)),
        )
        .one(&ctx.db)
        .await?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Name or email already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let created = user::ActiveModel {
        name: Set(request.name),
        email: Set(request.email),
        password_hash: Set(password_hash),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    info!("registered user '{}'", created.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserInfo::from(created))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<ApiContext>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let found = user::Entity::find()
        .filter(user::Column::Name.eq(&request.name))
        .one(&ctx.db)
        .await?;

    let Some(found) = found else {
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&request.password, &found.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = ctx
        .tokens
        .issue(&found.name)
        .map_err(|e| ApiError::Internal(format!("token issuance failed: {e}")))?;

    info!("user '{}' logged in", found.name);
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user info", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<ApiResponse<UserInfo>> {
    Json(ApiResponse::success(UserInfo {
        id: current.id,
        name: current.name,
        email: current.email,
    }))
}

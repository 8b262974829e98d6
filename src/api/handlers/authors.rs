//! Author CRUD handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::common::{double_option, ApiResponse, ValidatedJson};
use crate::api::ApiContext;
use crate::db::entities::{author, book};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl From<author::Model> for AuthorDto {
    fn from(a: author::Model) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            phone: a.phone,
            bio: a.bio,
        }
    }
}

/// Full payload: used for create and replace.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorPayload {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// Partial payload: only fields present in the JSON body are applied.
/// For nullable columns an explicit `null` clears the value.
#[derive(Debug, Deserialize, Validate, ToSchema, Default)]
pub struct AuthorPatch {
    #[validate(length(min = 1, max = 255, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
}

async fn ensure_email_free(
    ctx: &ApiContext,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<(), ApiError> {
    let mut query = author::Entity::find().filter(author::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(author::Column::Id.ne(id));
    }
    if query.one(&ctx.db).await?.is_some() {
        return Err(ApiError::Conflict(
            "Author email already registered".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/authors",
    tag = "Authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Author list", body = ApiResponse<Vec<AuthorDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_authors(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<Vec<AuthorDto>>>, ApiError> {
    let authors = author::Entity::find().all(&ctx.db).await?;
    let items: Vec<AuthorDto> = authors.into_iter().map(AuthorDto::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/authors/{id}",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author details", body = ApiResponse<AuthorDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_author(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    let found = author::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Author"))?;
    Ok(Json(ApiResponse::success(AuthorDto::from(found))))
}

#[utoipa::path(
    post,
    path = "/api/v1/authors",
    tag = "Authors",
    security(("bearer_auth" = [])),
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Created", body = ApiResponse<AuthorDto>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_author(
    State(ctx): State<ApiContext>,
    ValidatedJson(payload): ValidatedJson<AuthorPayload>,
) -> Result<(StatusCode, Json<ApiResponse<AuthorDto>>), ApiError> {
    ensure_email_free(&ctx, &payload.email, None).await?;

    let created = author::ActiveModel {
        name: Set(payload.name),
        email: Set(payload.email),
        phone: Set(payload.phone),
        bio: Set(payload.bio),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthorDto::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/authors/{id}",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author id")),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Replaced", body = ApiResponse<AuthorDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_author(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<AuthorPayload>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    let found = author::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Author"))?;
    ensure_email_free(&ctx, &payload.email, Some(id)).await?;

    let mut active: author::ActiveModel = found.into();
    active.name = Set(payload.name);
    active.email = Set(payload.email);
    active.phone = Set(payload.phone);
    active.bio = Set(payload.bio);

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(AuthorDto::from(updated))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/authors/{id}",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author id")),
    request_body = AuthorPatch,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<AuthorDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn patch_author(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<AuthorPatch>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    let found = author::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Author"))?;

    if let Some(email) = &patch.email {
        ensure_email_free(&ctx, email, Some(id)).await?;
    }

    let mut active: author::ActiveModel = found.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(email) = patch.email {
        active.email = Set(email);
    }
    if let Some(phone) = patch.phone {
        active.phone = Set(phone);
    }
    if let Some(bio) = patch.bio {
        active.bio = Set(bio);
    }

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(AuthorDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/authors/{id}",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Still referenced by books")
    )
)]
pub async fn delete_author(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let referencing = book::Entity::find()
        .filter(book::Column::AuthorId.eq(id))
        .count(&ctx.db)
        .await?;
    if referencing > 0 {
        return Err(ApiError::Conflict(format!(
            "Author is referenced by {referencing} book(s)"
        )));
    }

    let result = author::Entity::delete_by_id(id).exec(&ctx.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Author"));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Category CRUD handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::common::{ApiResponse, ValidatedJson};
use crate::api::ApiContext;
use crate::db::entities::{book, category};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
}

impl From<category::Model> for CategoryDto {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
}

/// Partial payload: an absent `name` leaves the record untouched.
#[derive(Debug, Deserialize, Validate, ToSchema, Default)]
pub struct CategoryPatch {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: Option<String>,
}

async fn ensure_name_free(
    ctx: &ApiContext,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<(), ApiError> {
    let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.one(&ctx.db).await?.is_some() {
        return Err(ApiError::Conflict("Category name already exists".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category list", body = ApiResponse<Vec<CategoryDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_categories(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = category::Entity::find().all(&ctx.db).await?;
    let items: Vec<CategoryDto> = categories.into_iter().map(CategoryDto::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category details", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_category(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let found = category::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;
    Ok(Json(ApiResponse::success(CategoryDto::from(found))))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Created", body = ApiResponse<CategoryDto>),
        (status = 409, description = "Name already exists"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_category(
    State(ctx): State<ApiContext>,
    ValidatedJson(payload): ValidatedJson<CategoryPayload>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryDto>>), ApiError> {
    ensure_name_free(&ctx, &payload.name, None).await?;

    let created = category::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CategoryDto::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Replaced", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_category(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CategoryPayload>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let found = category::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;
    ensure_name_free(&ctx, &payload.name, Some(id)).await?;

    let mut active: category::ActiveModel = found.into();
    active.name = Set(payload.name);

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(CategoryDto::from(updated))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryPatch,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn patch_category(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<CategoryPatch>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let found = category::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    let Some(name) = patch.name else {
        // Empty patch leaves the record untouched.
        return Ok(Json(ApiResponse::success(CategoryDto::from(found))));
    };
    ensure_name_free(&ctx, &name, Some(id)).await?;

    let mut active: category::ActiveModel = found.into();
    active.name = Set(name);

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(CategoryDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Still referenced by books")
    )
)]
pub async fn delete_category(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let referencing = book::Entity::find()
        .filter(book::Column::CategoryId.eq(id))
        .count(&ctx.db)
        .await?;
    if referencing > 0 {
        return Err(ApiError::Conflict(format!(
            "Category is referenced by {referencing} book(s)"
        )));
    }

    let result = category::Entity::delete_by_id(id).exec(&ctx.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Category"));
    }
    Ok(StatusCode::NO_CONTENT)
}

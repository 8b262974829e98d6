//! Publisher CRUD handlers

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
use crate::db::entities::{book, publisher};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublisherDto {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<publisher::Model> for PublisherDto {
    fn from(p: publisher::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            phone: p.phone,
        }
    }
}

/// Full payload: used for create and replace.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PublisherPayload {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Partial payload: only fields present in the JSON body are applied.
#[derive(Debug, Deserialize, Validate, ToSchema, Default)]
pub struct PublisherPatch {
    #[validate(length(min = 1, max = 255, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
}

#[utoipa::path(
    get,
    path = "/api/v1/publishers",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Publisher list", body = ApiResponse<Vec<PublisherDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_publishers(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<Vec<PublisherDto>>>, ApiError> {
    let publishers = publisher::Entity::find().all(&ctx.db).await?;
    let items: Vec<PublisherDto> = publishers.into_iter().map(PublisherDto::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/publishers/{id}",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Publisher id")),
    responses(
        (status = 200, description = "Publisher details", body = ApiResponse<PublisherDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_publisher(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PublisherDto>>, ApiError> {
    let found = publisher::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Publisher"))?;
    Ok(Json(ApiResponse::success(PublisherDto::from(found))))
}

#[utoipa::path(
    post,
    path = "/api/v1/publishers",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    request_body = PublisherPayload,
    responses(
        (status = 201, description = "Created", body = ApiResponse<PublisherDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_publisher(
    State(ctx): State<ApiContext>,
    ValidatedJson(payload): ValidatedJson<PublisherPayload>,
) -> Result<(StatusCode, Json<ApiResponse<PublisherDto>>), ApiError> {
    let created = publisher::ActiveModel {
        name: Set(payload.name),
        address: Set(payload.address),
        phone: Set(payload.phone),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PublisherDto::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/publishers/{id}",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Publisher id")),
    request_body = PublisherPayload,
    responses(
        (status = 200, description = "Replaced", body = ApiResponse<PublisherDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_publisher(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<PublisherPayload>,
) -> Result<Json<ApiResponse<PublisherDto>>, ApiError> {
    let found = publisher::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Publisher"))?;

    let mut active: publisher::ActiveModel = found.into();
    active.name = Set(payload.name);
    active.address = Set(payload.address);
    active.phone = Set(payload.phone);

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(PublisherDto::from(updated))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/publishers/{id}",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Publisher id")),
    request_body = PublisherPatch,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<PublisherDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn patch_publisher(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<PublisherPatch>,
) -> Result<Json<ApiResponse<PublisherDto>>, ApiError> {
    let found = publisher::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Publisher"))?;

    let mut active: publisher::ActiveModel = found.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(address) = patch.address {
        active.address = Set(address);
    }
    if let Some(phone) = patch.phone {
        active.phone = Set(phone);
    }

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(PublisherDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/publishers/{id}",
    tag = "Publishers",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Publisher id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Still referenced by books")
    )
)]
pub async fn delete_publisher(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let referencing = book::Entity::find()
        .filter(book::Column::PublisherId.eq(id))
        .count(&ctx.db)
        .await?;
    if referencing > 0 {
        return Err(ApiError::Conflict(format!(
            "Publisher is referenced by {referencing} book(s)"
        )));
    }

    let result = publisher::Entity::delete_by_id(id).exec(&ctx.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Publisher"));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Book CRUD handlers
//!
//! Books reference an author, a category and a publisher. Writes check
//! that the referenced rows exist and reject the request with a
//! validation error otherwise, so the catalog never holds a dangling id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::common::{double_option, ApiResponse, ValidatedJson};
use crate::api::ApiContext;
use crate::db::entities::{author, book, category, publisher};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub year: i32,
    pub pages: i32,
    pub isbn: String,
    pub author_id: i64,
    pub category_id: i64,
    pub publisher_id: i64,
}

impl From<book::Model> for BookDto {
    fn from(b: book::Model) -> Self {
        Self {
            id: b.id,
            title: b.title,
            summary: b.summary,
            year: b.year,
            pages: b.pages,
            isbn: b.isbn,
            author_id: b.author_id,
            category_id: b.category_id,
            publisher_id: b.publisher_id,
        }
    }
}

/// Full payload: used for create and replace.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    pub summary: Option<String>,
    #[validate(range(min = 1, message = "year must be positive"))]
    pub year: i32,
    #[validate(range(min = 1, message = "pages must be positive"))]
    pub pages: i32,
    #[validate(length(min = 1, max = 32, message = "isbn is required"))]
    pub isbn: String,
    pub author_id: i64,
    pub category_id: i64,
    pub publisher_id: i64,
}

/// Partial payload: only fields present in the JSON body are applied.
/// An explicit `null` clears the nullable summary.
#[derive(Debug, Deserialize, Validate, ToSchema, Default)]
pub struct BookPatch {
    #[validate(length(min = 1, max = 255, message = "title cannot be empty"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub summary: Option<Option<String>>,
    #[validate(range(min = 1, message = "year must be positive"))]
    pub year: Option<i32>,
    #[validate(range(min = 1, message = "pages must be positive"))]
    pub pages: Option<i32>,
    #[validate(length(min = 1, max = 32, message = "isbn cannot be empty"))]
    pub isbn: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub publisher_id: Option<i64>,
}

async fn ensure_author_exists(ctx: &ApiContext, id: i64) -> Result<(), ApiError> {
    if author::Entity::find_by_id(id).one(&ctx.db).await?.is_none() {
        return Err(ApiError::Validation(format!("unknown author_id {id}")));
    }
    Ok(())
}

async fn ensure_category_exists(ctx: &ApiContext, id: i64) -> Result<(), ApiError> {
    if category::Entity::find_by_id(id).one(&ctx.db).await?.is_none() {
        return Err(ApiError::Validation(format!("unknown category_id {id}")));
    }
    Ok(())
}

async fn ensure_publisher_exists(ctx: &ApiContext, id: i64) -> Result<(), ApiError> {
    if publisher::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .is_none()
    {
        return Err(ApiError::Validation(format!("unknown publisher_id {id}")));
    }
    Ok(())
}

async fn ensure_references_exist(
    ctx: &ApiContext,
    author_id: i64,
    category_id: i64,
    publisher_id: i64,
) -> Result<(), ApiError> {
    ensure_author_exists(ctx, author_id).await?;
    ensure_category_exists(ctx, category_id).await?;
    ensure_publisher_exists(ctx, publisher_id).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    tag = "Books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book list", body = ApiResponse<Vec<BookDto>>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<Vec<BookDto>>>, ApiError> {
    let books = book::Entity::find().all(&ctx.db).await?;
    let items: Vec<BookDto> = books.into_iter().map(BookDto::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    tag = "Books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book details", body = ApiResponse<BookDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_book(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    let found = book::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Book"))?;
    Ok(Json(ApiResponse::success(BookDto::from(found))))
}

#[utoipa::path(
    post,
    path = "/api/v1/books",
    tag = "Books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Created", body = ApiResponse<BookDto>),
        (status = 422, description = "Validation error or unknown reference")
    )
)]
pub async fn create_book(
    State(ctx): State<ApiContext>,
    ValidatedJson(payload): ValidatedJson<BookPayload>,
) -> Result<(StatusCode, Json<ApiResponse<BookDto>>), ApiError> {
    ensure_references_exist(
        &ctx,
        payload.author_id,
        payload.category_id,
        payload.publisher_id,
    )
    .await?;

    let created = book::ActiveModel {
        title: Set(payload.title),
        summary: Set(payload.summary),
        year: Set(payload.year),
        pages: Set(payload.pages),
        isbn: Set(payload.isbn),
        author_id: Set(payload.author_id),
        category_id: Set(payload.category_id),
        publisher_id: Set(payload.publisher_id),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BookDto::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    tag = "Books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Replaced", body = ApiResponse<BookDto>),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation error or unknown reference")
    )
)]
pub async fn replace_book(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<BookPayload>,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    let found = book::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Book"))?;
    ensure_references_exist(
        &ctx,
        payload.author_id,
        payload.category_id,
        payload.publisher_id,
    )
    .await?;

    let mut active: book::ActiveModel = found.into();
    active.title = Set(payload.title);
    active.summary = Set(payload.summary);
    active.year = Set(payload.year);
    active.pages = Set(payload.pages);
    active.isbn = Set(payload.isbn);
    active.author_id = Set(payload.author_id);
    active.category_id = Set(payload.category_id);
    active.publisher_id = Set(payload.publisher_id);

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(BookDto::from(updated))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/books/{id}",
    tag = "Books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookPatch,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<BookDto>),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation error or unknown reference")
    )
)]
pub async fn patch_book(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<BookPatch>,
) -> Result<Json<ApiResponse<BookDto>>, ApiError> {
    let found = book::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or(ApiError::NotFound("Book"))?;

    if let Some(author_id) = patch.author_id {
        ensure_author_exists(&ctx, author_id).await?;
    }
    if let Some(category_id) = patch.category_id {
        ensure_category_exists(&ctx, category_id).await?;
    }
    if let Some(publisher_id) = patch.publisher_id {
        ensure_publisher_exists(&ctx, publisher_id).await?;
    }

    let mut active: book::ActiveModel = found.into();
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(summary) = patch.summary {
        active.summary = Set(summary);
    }
    if let Some(year) = patch.year {
        active.year = Set(year);
    }
    if let Some(pages) = patch.pages {
        active.pages = Set(pages);
    }
    if let Some(isbn) = patch.isbn {
        active.isbn = Set(isbn);
    }
    if let Some(author_id) = patch.author_id {
        active.author_id = Set(author_id);
    }
    if let Some(category_id) = patch.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(publisher_id) = patch.publisher_id {
        active.publisher_id = Set(publisher_id);
    }

    let updated = active.update(&ctx.db).await?;
    Ok(Json(ApiResponse::success(BookDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    tag = "Books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_book(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = book::Entity::delete_by_id(id).exec(&ctx.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Book"));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::common::ApiResponse;
use crate::api::ApiContext;
use crate::auth::middleware::AuthState;
use crate::auth::{auth_middleware, TokenService};

use super::handlers::{auth, authors, books, categories, health, publishers};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::replace_author,
        authors::patch_author,
        authors::delete_author,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::replace_category,
        categories::patch_category,
        categories::delete_category,
        // Publishers
        publishers::list_publishers,
        publishers::get_publisher,
        publishers::create_publisher,
        publishers::replace_publisher,
        publishers::patch_publisher,
        publishers::delete_publisher,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::replace_book,
        books::patch_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            // Auth
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Authors
            authors::AuthorDto,
            authors::AuthorPayload,
            authors::AuthorPatch,
            // Categories
            categories::CategoryDto,
            categories::CategoryPayload,
            categories::CategoryPatch,
            // Publishers
            publishers::PublisherDto,
            publishers::PublisherPayload,
            publishers::PublisherPatch,
            // Books
            books::BookDto,
            books::BookPayload,
            books::BookPatch,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "User registration and JWT login"),
        (name = "Authors", description = "Author CRUD operations"),
        (name = "Categories", description = "Category CRUD operations"),
        (name = "Publishers", description = "Publisher CRUD operations"),
        (name = "Books", description = "Book CRUD operations"),
    ),
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "REST API for managing a library catalog: books, authors, categories and publishers"
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(db: DatabaseConnection, tokens: Arc<TokenService>) -> Router {
    let middleware_state = AuthState {
        db: db.clone(),
        tokens: Arc::clone(&tokens),
    };

    let ctx = ApiContext { db, tokens };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .with_state(ctx.clone());

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(ctx.clone());

    // Author routes (protected)
    let author_routes = Router::new()
        .route("/", get(authors::list_authors).post(authors::create_author))
        .route(
            "/{id}",
            get(authors::get_author)
                .put(authors::replace_author)
                .patch(authors::patch_author)
                .delete(authors::delete_author),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(ctx.clone());

    // Category routes (protected)
    let category_routes = Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            get(categories::get_category)
                .put(categories::replace_category)
                .patch(categories::patch_category)
                .delete(categories::delete_category),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(ctx.clone());

    // Publisher routes (protected)
    let publisher_routes = Router::new()
        .route(
            "/",
            get(publishers::list_publishers).post(publishers::create_publisher),
        )
        .route(
            "/{id}",
            get(publishers::get_publisher)
                .put(publishers::replace_publisher)
                .patch(publishers::patch_publisher)
                .delete(publishers::delete_publisher),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(ctx.clone());

    // Book routes (protected)
    let book_routes = Router::new()
        .route("/", get(books::list_books).post(books::create_book))
        .route(
            "/{id}",
            get(books::get_book)
                .put(books::replace_book)
                .patch(books::patch_book)
                .delete(books::delete_book),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(ctx);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        // Auth
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", auth_protected_routes)
        // Catalog resources
        .nest("/api/v1/authors", author_routes)
        .nest("/api/v1/categories", category_routes)
        .nest("/api/v1/publishers", publisher_routes)
        .nest("/api/v1/books", book_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use jsonwebtoken::Algorithm;
    use sea_orm::ConnectOptions;
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};
    use tower::Service;

    use crate::config::AuthConfig;
    use crate::db::migrator::Migrator;

    async fn test_router() -> Router {
        // Single connection so every request sees the same in-memory database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = sea_orm::Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tokens = Arc::new(TokenService::new(&AuthConfig {
            secret: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            token_expiry_minutes: 60,
        }));

        create_api_router(db, tokens)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn authed_request(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }

    async fn send(router: &mut Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.call(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register_and_login(router: &mut Router) -> String {
        let (status, _) = send(
            router,
            json_request(
                Method::POST,
                "/api/v1/auth/register",
                json!({"name": "librarian", "email": "librarian@example.com", "password": "s3cret-pw"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            router,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                json!({"name": "librarian", "password": "s3cret-pw"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap().to_string();
        assert!(!token.is_empty());
        token
    }

    async fn create_author(router: &mut Router, token: &str, email: &str) -> i64 {
        let (status, body) = send(
            router,
            authed_request(
                Method::POST,
                "/api/v1/authors",
                token,
                Some(json!({"name": "Clarice Lispector", "email": email})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn register_returns_created_user_without_password() {
        let mut router = test_router().await;
        let (status, body) = send(
            &mut router,
            json_request(
                Method::POST,
                "/api/v1/auth/register",
                json!({"name": "ana", "email": "ana@example.com", "password": "hunter22"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert!(body["data"]["id"].as_i64().unwrap() >= 1);
        assert_eq!(body["data"]["name"], "ana");
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let mut router = test_router().await;
        let payload = json!({"name": "ana", "email": "ana@example.com", "password": "hunter22"});

        let (status, _) = send(
            &mut router,
            json_request(Method::POST, "/api/v1/auth/register", payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &mut router,
            json_request(Method::POST, "/api/v1/auth/register", payload),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let mut router = test_router().await;
        let _token = register_and_login(&mut router).await;

        let (wrong_pw_status, wrong_pw_body) = send(
            &mut router,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                json!({"name": "librarian", "password": "not-the-password"}),
            ),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &mut router,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                json!({"name": "nobody", "password": "whatever-pw"}),
            ),
        )
        .await;

        assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw_body, unknown_body);
    }

    #[tokio::test]
    async fn me_reflects_the_token_subject() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        let (status, body) = send(
            &mut router,
            authed_request(Method::GET, "/api/v1/auth/me", &token, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "librarian");
        assert_eq!(body["data"]["email"], "librarian@example.com");
    }

    #[tokio::test]
    async fn protected_route_requires_a_token() {
        let mut router = test_router().await;

        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/authors")
            .body(Body::empty())
            .unwrap();
        let resp = router.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let (status, _) = send(
            &mut router,
            authed_request(Method::GET, "/api/v1/authors", "garbage-token", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn author_crud_lifecycle() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        let id = create_author(&mut router, &token, "clarice@example.com").await;

        let (status, body) = send(
            &mut router,
            authed_request(Method::GET, &format!("/api/v1/authors/{id}"), &token, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Clarice Lispector");

        let (status, body) = send(
            &mut router,
            authed_request(Method::GET, "/api/v1/authors", &token, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = send(
            &mut router,
            authed_request(
                Method::DELETE,
                &format!("/api/v1/authors/{id}"),
                &token,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &mut router,
            authed_request(Method::GET, &format!("/api/v1/authors/{id}"), &token, None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        for uri in [
            "/api/v1/authors/9999",
            "/api/v1/categories/9999",
            "/api/v1/publishers/9999",
            "/api/v1/books/9999",
        ] {
            let (status, body) =
                send(&mut router, authed_request(Method::GET, uri, &token, None)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn patch_changes_only_the_given_fields() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::POST,
                "/api/v1/authors",
                &token,
                Some(json!({
                    "name": "Machado de Assis",
                    "email": "machado@example.com",
                    "phone": "+55 21 5550-0001",
                    "bio": "Novelist"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::PATCH,
                &format!("/api/v1/authors/{id}"),
                &token,
                Some(json!({"bio": "Novelist and chronicler"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bio"], "Novelist and chronicler");
        assert_eq!(body["data"]["name"], "Machado de Assis");
        assert_eq!(body["data"]["phone"], "+55 21 5550-0001");

        // An explicit null clears the nullable column.
        let (status, body) = send(
            &mut router,
            authed_request(
                Method::PATCH,
                &format!("/api/v1/authors/{id}"),
                &token,
                Some(json!({"phone": null})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["phone"], Value::Null);
        assert_eq!(body["data"]["bio"], "Novelist and chronicler");
    }

    #[tokio::test]
    async fn replace_sets_every_field() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        let (_, body) = send(
            &mut router,
            authed_request(
                Method::POST,
                "/api/v1/publishers",
                &token,
                Some(json!({"name": "Companhia das Letras", "phone": "+55 11 5550-0002"})),
            ),
        )
        .await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::PUT,
                &format!("/api/v1/publishers/{id}"),
                &token,
                Some(json!({"name": "Editora 34", "address": "Sao Paulo"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Editora 34");
        assert_eq!(body["data"]["address"], "Sao Paulo");
        // Absent from the replacement payload, so it is cleared.
        assert_eq!(body["data"]["phone"], Value::Null);
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;

        let payload = json!({"name": "Fiction"});
        let (status, _) = send(
            &mut router,
            authed_request(
                Method::POST,
                "/api/v1/categories",
                &token,
                Some(payload.clone()),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &mut router,
            authed_request(Method::POST, "/api/v1/categories", &token, Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    async fn seed_book(router: &mut Router, token: &str) -> (i64, i64, i64, i64) {
        let author_id = create_author(router, token, "clarice@example.com").await;

        let (_, body) = send(
            router,
            authed_request(
                Method::POST,
                "/api/v1/categories",
                token,
                Some(json!({"name": "Fiction"})),
            ),
        )
        .await;
        let category_id = body["data"]["id"].as_i64().unwrap();

        let (_, body) = send(
            router,
            authed_request(
                Method::POST,
                "/api/v1/publishers",
                token,
                Some(json!({"name": "Rocco"})),
            ),
        )
        .await;
        let publisher_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            router,
            authed_request(
                Method::POST,
                "/api/v1/books",
                token,
                Some(json!({
                    "title": "A Hora da Estrela",
                    "year": 1977,
                    "pages": 96,
                    "isbn": "978-85-325-0514-0",
                    "author_id": author_id,
                    "category_id": category_id,
                    "publisher_id": publisher_id
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let book_id = body["data"]["id"].as_i64().unwrap();

        (book_id, author_id, category_id, publisher_id)
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;
        let (book_id, author_id, category_id, publisher_id) =
            seed_book(&mut router, &token).await;

        for uri in [
            format!("/api/v1/authors/{author_id}"),
            format!("/api/v1/categories/{category_id}"),
            format!("/api/v1/publishers/{publisher_id}"),
        ] {
            let (status, body) =
                send(&mut router, authed_request(Method::DELETE, &uri, &token, None)).await;
            assert_eq!(status, StatusCode::CONFLICT, "{uri}");
            assert_eq!(body["success"], false);
        }

        // Removing the book unblocks its parents.
        let (status, _) = send(
            &mut router,
            authed_request(
                Method::DELETE,
                &format!("/api/v1/books/{book_id}"),
                &token,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &mut router,
            authed_request(
                Method::DELETE,
                &format!("/api/v1/categories/{category_id}"),
                &token,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn book_with_unknown_reference_is_rejected() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;
        let (book_id, author_id, category_id, _publisher_id) =
            seed_book(&mut router, &token).await;

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::POST,
                "/api/v1/books",
                &token,
                Some(json!({
                    "title": "Ghost Book",
                    "year": 2000,
                    "pages": 100,
                    "isbn": "000-0-00-000000-0",
                    "author_id": author_id,
                    "category_id": category_id,
                    "publisher_id": 9999
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &mut router,
            authed_request(
                Method::PATCH,
                &format!("/api/v1/books/{book_id}"),
                &token,
                Some(json!({"author_id": 9999})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn book_patch_clears_summary_with_null() {
        let mut router = test_router().await;
        let token = register_and_login(&mut router).await;
        let (book_id, ..) = seed_book(&mut router, &token).await;

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::PATCH,
                &format!("/api/v1/books/{book_id}"),
                &token,
                Some(json!({"summary": "A short tragic novel"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"], "A short tragic novel");

        let (status, body) = send(
            &mut router,
            authed_request(
                Method::PATCH,
                &format!("/api/v1/books/{book_id}"),
                &token,
                Some(json!({"summary": null})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"], Value::Null);
        assert_eq!(body["data"]["title"], "A Hora da Estrela");
    }

    #[tokio::test]
    async fn health_does_not_require_auth() {
        let mut router = test_router().await;
        let req = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&mut router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

//! Authentication middleware for axum
//!
//! Single enforcement point for protected routes: extracts the bearer
//! credential, verifies it against the process-wide [`TokenService`],
//! resolves the subject to a user row and attaches it to the request.
//! Every failure short-circuits with the same generic 401; the concrete
//! failure kind is only visible in debug logs.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::auth::token::TokenService;
use crate::db::entities::user;
use crate::error::ApiError;

/// State required by the middleware: token verifier plus credential store.
#[derive(Clone)]
pub struct AuthState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
}

/// The authenticated identity, attached to request extensions on success.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for CurrentUser {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Bearer-token authentication middleware.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return ApiError::Unauthorized.into_response();
    };

    let Some(token) = extract_bearer(&auth_header) else {
        return ApiError::Unauthorized.into_response();
    };

    let subject = match state.tokens.verify(token) {
        Ok(subject) => subject,
        Err(kind) => {
            debug!("token rejected: {kind}");
            return ApiError::Unauthorized.into_response();
        }
    };

    let found = user::Entity::find()
        .filter(user::Column::Name.eq(&subject))
        .one(&state.db)
        .await;

    match found {
        Ok(Some(u)) => {
            request.extensions_mut().insert(CurrentUser::from(u));
            next.run(request).await
        }
        // Unknown subject looks exactly like a bad token to the caller.
        Ok(None) => {
            debug!("token subject '{subject}' has no matching user");
            ApiError::Unauthorized.into_response()
        }
        Err(e) => ApiError::Database(e).into_response(),
    }
}

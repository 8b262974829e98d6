//! Authentication: password hashing, token service, request middleware

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{auth_middleware, CurrentUser};
pub use token::{TokenError, TokenService};

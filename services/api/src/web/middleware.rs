//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.
//!
//! Authentication happens upstream (an auth gateway); it forwards the resolved
//! user in the `x-user-id`, `x-user-name` and `x-user-role` headers. These
//! middlewares turn those headers into an [`Identity`] request extension.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use catalog_core::domain::ReviewAuthor;
use tracing::debug;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// The acting user, as resolved by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl Identity {
    /// Reads the identity headers. `None` when no user id was forwarded.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = header_value(headers, USER_ID_HEADER)?.to_string();
        let name = header_value(headers, USER_NAME_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| user_id.clone());
        let role = match header_value(headers, USER_ROLE_HEADER) {
            Some(role) if role.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        };

        Some(Self { user_id, name, role })
    }

    pub fn into_author(self) -> ReviewAuthor {
        ReviewAuthor::User {
            id: self.user_id,
            name: self.name,
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolves an optional identity. Never rejects; handlers see
/// `Extension<Option<Identity>>`.
pub async fn identify(mut req: Request, next: Next) -> Response {
    let identity = Identity::from_headers(req.headers());
    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Rejects requests without an identity with 401.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = Identity::from_headers(req.headers()).ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Rejects requests without an identity with 401 and non-admins with 403.
pub async fn require_admin(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = Identity::from_headers(req.headers()).ok_or(ApiError::Unauthorized)?;
    if identity.role != Role::Admin {
        debug!("User {} denied admin access", identity.user_id);
        return Err(ApiError::Forbidden);
    }
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};
use thiserror::Error;

/// Why a request could not be authenticated. Every variant maps to 401.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Authorization header must be a Bearer token")]
    NotBearer,
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),
    #[error("Unknown role {0}")]
    UnknownRole(u8),
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to a worker profile
    pub worker_id: Option<u64>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::from_id(claims.role).ok_or(AuthError::UnknownRole(claims.role))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            worker_id: claims.worker_id,
        })
    }
}

/// Reads the user that `auth_middleware` attached to the request.
impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Not authenticated")),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager/Admin only"))
        }
    }

    /// Check-in is only possible for accounts linked to a worker.
    pub fn require_worker(&self) -> actix_web::Result<u64> {
        self.worker_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No worker profile"))
    }
}

use crate::auth::auth::{AuthError, AuthUser};
use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use serde_json::json;

fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::NotBearer)
}

fn authenticate(req: &ServiceRequest, secret: &str) -> Result<AuthUser, AuthError> {
    let token = bearer_token(req)?;
    let claims = verify_access_token(token, secret).map_err(AuthError::InvalidToken)?;
    AuthUser::try_from(claims)
}

/// Verifies the bearer access token and attaches the [`AuthUser`] for
/// handlers to extract. Rejected requests never reach the handler.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let outcome = match req.app_data::<Data<Config>>() {
        Some(config) => authenticate(&req, &config.jwt_secret),
        None => return Err(actix_web::error::ErrorInternalServerError("App config missing")),
    };

    match outcome {
        Ok(user) => {
            tracing::debug!(
                user_id = user.user_id,
                role = ?user.role,
                worker_id = ?user.worker_id,
                path = %req.path(),
                "Authenticated request"
            );
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %req.path(), "Rejected unauthenticated request");
            let resp = HttpResponse::Unauthorized().json(json!({ "error": e.to_string() }));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}

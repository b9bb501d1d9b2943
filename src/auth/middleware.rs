use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::auth::policy;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::user::User;
use crate::models::TokenType;
use crate::store::Store;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

fn unauthorized(message: &str) -> AppError {
    AppError::Auth(message.to_string())
}

/// Resolves the bearer token to a live user.
///
/// Claims only identify the user; role and division come from the store so
/// changes apply to tokens already issued.
async fn authenticate(header: Option<&str>, store: &dyn Store, config: &Config) -> AppResult<User> {
    let header_value = header.ok_or_else(|| unauthorized("Missing Authorization header"))?;
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Authorization header must start with Bearer"))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Token rejected");
        unauthorized("Invalid or expired token")
    })?;
    if claims.token_type != TokenType::Access {
        return Err(unauthorized("Access token required"));
    }

    let user = store
        .find_user(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| unauthorized("User not found or inactive"))?;
    policy::role_of(&user).map_err(|_| unauthorized("Invalid role"))?;

    Ok(user)
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
    let store = req
        .app_data::<Data<dyn Store>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Store missing"))?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    match authenticate(header.as_deref(), store.get_ref(), &config).await {
        Ok(user) => {
            req.extensions_mut().insert(AuthUser(user));
            next.call(req).await
        }
        Err(err) => {
            let resp = err.error_response();
            Ok(req.into_response(resp))
        }
    }
}

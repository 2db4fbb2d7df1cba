use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::UserType;
use shared_models::error::AppError;

use crate::jwt::validate_token;

fn bearer_token(request: &Request<Body>) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

async fn require_user_type(
    config: Arc<AppConfig>,
    mut request: Request<Body>,
    next: Next,
    expected: UserType,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let user = validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    if user.user_type != expected {
        return Err(AppError::Auth("Authentication required".to_string()));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate for doctor-only routes; inserts the `AuthUser` extension.
pub async fn require_doctor(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_user_type(config, request, next, UserType::Doctor).await
}

/// Gate for patient-only routes; inserts the `AuthUser` extension.
pub async fn require_patient(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_user_type(config, request, next, UserType::Patient).await
}

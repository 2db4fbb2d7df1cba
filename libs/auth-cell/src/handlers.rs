use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::typed_header::{TypedHeader, TypedHeaderRejection};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::LoginRequest;
use crate::services::session::SessionService;

pub async fn login(
    State(service): State<Arc<SessionService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let response = service.login(request).await?;
    Ok(Json(json!(response)))
}

/// Sessions are stateless bearer tokens; logout just acknowledges so the
/// client drops its copy.
pub async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub async fn me(
    State(service): State<Arc<SessionService>>,
    auth: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Json<Value>, AppError> {
    // A missing or malformed header answers in the same envelope as a bad
    // token, not with the extractor's plain-text rejection.
    let TypedHeader(auth) =
        auth.map_err(|_| AppError::Auth("Authentication required".to_string()))?;
    let user = validate_token(auth.token(), service.jwt_secret()).map_err(AppError::Auth)?;
    Ok(Json(json!({ "user": user })))
}

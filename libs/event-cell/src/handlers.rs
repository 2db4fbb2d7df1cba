use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{CreateEventRequest, OverlapCheckRequest, UpdateEventRequest, WindowQuery};
use crate::services::scheduling::{CreatedEvents, EventSchedulingService};

pub async fn list_events(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Value>, AppError> {
    let events = service.list_for_doctor(user.id, &query).await?;
    Ok(Json(json!({ "events": events })))
}

pub async fn get_event(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let event = service.get(user.id, &event_id).await?;
    Ok(Json(json!({ "event": event })))
}

/// Accepts the single shape or the batch shape; the response mirrors the
/// request, one object or an array.
pub async fn create_event(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<Value>, AppError> {
    match service.create(user.id, request).await? {
        CreatedEvents::Single(event) => Ok(Json(json!(event))),
        CreatedEvents::Batch(events) => Ok(Json(json!(events))),
    }
}

pub async fn update_event(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<Value>, AppError> {
    let event = service.update(user.id, &event_id, request).await?;
    Ok(Json(json!(event)))
}

pub async fn delete_event(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    service.delete(user.id, &event_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Event deleted",
    })))
}

pub async fn overlap_check(
    State(service): State<Arc<EventSchedulingService>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<OverlapCheckRequest>,
) -> Result<Json<Value>, AppError> {
    let result = service.overlap_check(user.id, request).await?;
    Ok(Json(json!(result)))
}

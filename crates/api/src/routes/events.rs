//! Event catalogue endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{CreateEventRequest, Event, EventSummary, ListEventsQuery, UpdateEventRequest};
use domain::services;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminPrincipal, JsonBody};

#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeleteEventResponse {
    pub message: String,
    pub event_id: String,
}

/// GET /events?college_id=&type=&search=&feature=
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let events = services::list_events(&*state.store, &query).await?;
    Ok(Json(ListEventsResponse { events }))
}

/// POST /events (admin)
pub async fn create_event(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = services::create_event(&*state.store, request, Utc::now()).await?;
    tracing::info!(event_id = %event.event_id, admin = %admin.subject, "Event created via API");
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(services::get_event(&*state.store, &event_id).await?))
}

/// PUT /events/:event_id (admin)
pub async fn update_event(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    Path(event_id): Path<String>,
    JsonBody(request): JsonBody<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = services::update_event(&*state.store, &event_id, request).await?;
    Ok(Json(event))
}

/// DELETE /events/:event_id (admin)
pub async fn delete_event(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(event_id): Path<String>,
) -> Result<Json<DeleteEventResponse>, ApiError> {
    services::delete_event(&*state.store, &event_id).await?;
    tracing::info!(event_id = %event_id, admin = %admin.subject, "Event deleted via API");
    Ok(Json(DeleteEventResponse {
        message: "event deleted".to_string(),
        event_id,
    }))
}

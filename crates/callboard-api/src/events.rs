// Event lifecycle HTTP routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use callboard_core::Event;
use callboard_storage::EventVersionRow;

use crate::auth::AuthedActor;
use crate::common::{lifecycle_status, ListResponse};
use crate::services::EventService;

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

impl AppState {
    pub fn new(service: Arc<EventService>) -> Self {
        Self { service }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(create_event).get(list_events))
        .route("/v1/events/:event_id", get(get_event))
        .route("/v1/events/:event_id/versions", get(list_versions))
        .route("/v1/events/:event_id/submit", post(submit_event))
        .route("/v1/events/:event_id/clone", post(clone_event))
        .route("/v1/events/:event_id/review", post(review_event))
        .route("/v1/events/:event_id/publish", post(publish_event))
        .route("/v1/events/:event_id/complete", post(complete_event))
        .route("/v1/events/:event_id/cancel", post(cancel_event))
        .route("/v1/events/:event_id/reviewer", put(assign_reviewer))
        .with_state(state)
}

/// Request to create a draft event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub venue_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_space: Option<String>,
    #[serde(default)]
    pub area_ids: Vec<Uuid>,
}

/// Reviewer's verdict on a submitted event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    NeedsRevisions,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignReviewerRequest {
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
}

/// One immutable version snapshot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventVersion {
    pub id: Uuid,
    pub event_id: Uuid,
    pub version: i32,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<EventVersionRow> for EventVersion {
    fn from(row: EventVersionRow) -> Self {
        EventVersion {
            id: row.id,
            event_id: row.event_id,
            version: row.version,
            payload: row.payload,
            submitted_at: row.submitted_at,
            submitted_by: row.submitted_by,
            created_at: row.created_at,
        }
    }
}

/// POST /v1/events - Create a draft event with version #1
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Draft created", body = Event),
        (status = 403, description = "Actor may not create events for this venue"),
        (status = 422, description = "Invalid input"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), StatusCode> {
    let event = state
        .service
        .create(&actor, req)
        .await
        .map_err(|e| lifecycle_status("create event", e))?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events - List all events
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "List of events", body = ListResponse<Event>),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    AuthedActor(_actor): AuthedActor,
) -> Result<Json<ListResponse<Event>>, StatusCode> {
    let events = state
        .service
        .list()
        .await
        .map_err(|e| lifecycle_status("list events", e))?;
    Ok(Json(ListResponse::new(events)))
}

/// GET /v1/events/{event_id} - Get event by ID
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    AuthedActor(_actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .get(event_id)
        .await
        .map_err(|e| lifecycle_status("get event", e))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(event))
}

/// GET /v1/events/{event_id}/versions - Version history, oldest first
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/versions",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Version history", body = ListResponse<EventVersion>),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_versions(
    State(state): State<AppState>,
    AuthedActor(_actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListResponse<EventVersion>>, StatusCode> {
    let versions = state
        .service
        .versions(event_id)
        .await
        .map_err(|e| lifecycle_status("list versions", e))?;
    Ok(Json(ListResponse::new(
        versions.into_iter().map(EventVersion::from).collect(),
    )))
}

/// POST /v1/events/{event_id}/submit - Submit for review
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/submit",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event submitted", body = Event),
        (status = 403, description = "Actor is not the owner or a planner"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Not submittable from the current status"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn submit_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .submit(&actor, event_id)
        .await
        .map_err(|e| lifecycle_status("submit event", e))?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/clone - Clone into a fresh draft (planner only)
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/clone",
    params(("event_id" = Uuid, Path, description = "Source event ID")),
    responses(
        (status = 201, description = "Draft cloned", body = Event),
        (status = 403, description = "Only planners may clone"),
        (status = 404, description = "Source event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn clone_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Event>), StatusCode> {
    let event = state
        .service
        .clone_event(&actor, event_id)
        .await
        .map_err(|e| lifecycle_status("clone event", e))?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /v1/events/{event_id}/review - Record a review decision
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/review",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Decision recorded", body = Event),
        (status = 403, description = "Actor may not review"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is not awaiting review"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn review_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .review(&actor, event_id, req.decision)
        .await
        .map_err(|e| lifecycle_status("review event", e))?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/publish - Publish an approved event
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/publish",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event published", body = Event),
        (status = 403, description = "Only planners may publish"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is not approved"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn publish_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .publish(&actor, event_id)
        .await
        .map_err(|e| lifecycle_status("publish event", e))?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/complete - Debrief a published event
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/complete",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event completed", body = Event),
        (status = 403, description = "Only planners may complete"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is not published"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn complete_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .complete(&actor, event_id)
        .await
        .map_err(|e| lifecycle_status("complete event", e))?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/cancel - Cancel a non-terminal event
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/cancel",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event cancelled", body = Event),
        (status = 403, description = "Only planners may cancel"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is already closed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn cancel_event(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .cancel(&actor, event_id)
        .await
        .map_err(|e| lifecycle_status("cancel event", e))?;
    Ok(Json(event))
}

/// PUT /v1/events/{event_id}/reviewer - Assign a reviewer (planner only)
#[utoipa::path(
    put,
    path = "/v1/events/{event_id}/reviewer",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = AssignReviewerRequest,
    responses(
        (status = 200, description = "Reviewer assigned", body = Event),
        (status = 403, description = "Only planners may assign reviewers"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Event is closed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn assign_reviewer(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(event_id): Path<Uuid>,
    Json(req): Json<AssignReviewerRequest>,
) -> Result<Json<Event>, StatusCode> {
    let event = state
        .service
        .assign_reviewer(&actor, event_id, req.reviewer_id, &req.reviewer_name)
        .await
        .map_err(|e| lifecycle_status("assign reviewer", e))?;
    Ok(Json(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
    use axum::body::Body;
    use axum::http::Request;
    use callboard_core::{NullAuditObserver, SystemClock};
    use callboard_storage::Database;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool");
        let service = EventService::new(
            Arc::new(Database::new(pool)),
            Arc::new(NullAuditObserver),
            Arc::new(SystemClock),
        );
        routes(AppState::new(Arc::new(service)))
    }

    fn create_body() -> String {
        serde_json::json!({
            "title": "Jazz Night",
            "venue_id": Uuid::now_v7(),
        })
        .to_string()
    }

    #[tokio::test]
    async fn requests_without_actor_identity_are_401() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/events")
            .header("content-type", "application/json")
            .body(Body::from(create_body()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reviewers_may_not_create_events() {
        // Role check runs before any storage access
        let request = Request::builder()
            .method("POST")
            .uri("/v1/events")
            .header("content-type", "application/json")
            .header(ACTOR_ID_HEADER, Uuid::now_v7().to_string())
            .header(ACTOR_ROLE_HEADER, "reviewer")
            .body(Body::from(create_body()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

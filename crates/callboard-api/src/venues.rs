// Venue and area HTTP routes
//
// Thin surface: planners register venues and their physical areas; events
// reference them for conflict bucketing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use callboard_storage::{CreateVenue, CreateVenueArea, Database, VenueAreaRow, VenueRow};

use crate::auth::AuthedActor;
use crate::common::ListResponse;

/// App state for venue routes
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/venues", post(create_venue))
        .route("/v1/venues/:venue_id", get(get_venue))
        .route(
            "/v1/venues/:venue_id/areas",
            post(create_area).get(list_areas),
        )
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Venue {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VenueArea {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

impl From<VenueAreaRow> for VenueArea {
    fn from(row: VenueAreaRow) -> Self {
        VenueArea {
            id: row.id,
            venue_id: row.venue_id,
            name: row.name,
            capacity: row.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVenueRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVenueAreaRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

/// POST /v1/venues - Register a venue (planner only)
#[utoipa::path(
    post,
    path = "/v1/venues",
    request_body = CreateVenueRequest,
    responses(
        (status = 201, description = "Venue created", body = Venue),
        (status = 403, description = "Only planners may register venues"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
pub async fn create_venue(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Json(req): Json<CreateVenueRequest>,
) -> Result<(StatusCode, Json<Venue>), StatusCode> {
    if !actor.is_planner() {
        return Err(StatusCode::FORBIDDEN);
    }
    let row = state
        .db
        .create_venue(CreateVenue { name: req.name })
        .await
        .map_err(|e| {
            tracing::error!("failed to create venue: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /v1/venues/{venue_id} - Get venue by ID
#[utoipa::path(
    get,
    path = "/v1/venues/{venue_id}",
    params(("venue_id" = Uuid, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Venue found", body = Venue),
        (status = 404, description = "Venue not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
pub async fn get_venue(
    State(state): State<AppState>,
    AuthedActor(_actor): AuthedActor,
    Path(venue_id): Path<Uuid>,
) -> Result<Json<Venue>, StatusCode> {
    let row = state
        .db
        .get_venue(venue_id)
        .await
        .map_err(|e| {
            tracing::error!("failed to get venue: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(row.into()))
}

/// POST /v1/venues/{venue_id}/areas - Add a physical area (planner only)
#[utoipa::path(
    post,
    path = "/v1/venues/{venue_id}/areas",
    params(("venue_id" = Uuid, Path, description = "Venue ID")),
    request_body = CreateVenueAreaRequest,
    responses(
        (status = 201, description = "Area created", body = VenueArea),
        (status = 403, description = "Only planners may add areas"),
        (status = 404, description = "Venue not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
pub async fn create_area(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
    Path(venue_id): Path<Uuid>,
    Json(req): Json<CreateVenueAreaRequest>,
) -> Result<(StatusCode, Json<VenueArea>), StatusCode> {
    if !actor.is_planner() {
        return Err(StatusCode::FORBIDDEN);
    }
    state
        .db
        .get_venue(venue_id)
        .await
        .map_err(|e| {
            tracing::error!("failed to load venue: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let row = state
        .db
        .create_venue_area(CreateVenueArea {
            venue_id,
            name: req.name,
            capacity: req.capacity,
        })
        .await
        .map_err(|e| {
            tracing::error!("failed to create area: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /v1/venues/{venue_id}/areas - List a venue's areas
#[utoipa::path(
    get,
    path = "/v1/venues/{venue_id}/areas",
    params(("venue_id" = Uuid, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Areas", body = ListResponse<VenueArea>),
        (status = 500, description = "Internal server error")
    ),
    tag = "venues"
)]
pub async fn list_areas(
    State(state): State<AppState>,
    AuthedActor(_actor): AuthedActor,
    Path(venue_id): Path<Uuid>,
) -> Result<Json<ListResponse<VenueArea>>, StatusCode> {
    let rows = state.db.list_venue_areas(venue_id).await.map_err(|e| {
        tracing::error!("failed to list areas: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(ListResponse::new(
        rows.into_iter().map(VenueArea::from).collect(),
    )))
}

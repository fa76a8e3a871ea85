// ICS calendar feed

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use callboard_core::{ics, Clock};

use crate::services::PlanningService;

/// App state for the calendar feed
#[derive(Clone)]
pub struct AppState {
    pub planning: Arc<PlanningService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(planning: Arc<PlanningService>, clock: Arc<dyn Clock>) -> Self {
        Self { planning, clock }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/planning/calendar.ics", get(get_calendar))
        .with_state(state)
}

/// GET /v1/planning/calendar.ics - text/calendar export of all schedulable
/// events, conflict-flagged from the same read model the dashboard uses
#[utoipa::path(
    get,
    path = "/v1/planning/calendar.ics",
    responses(
        (status = 200, description = "ICS document", body = String, content_type = "text/calendar"),
        (status = 500, description = "Internal server error")
    ),
    tag = "planning"
)]
pub async fn get_calendar(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let analytics = state.planning.read_model().await.map_err(|e| {
        tracing::error!("failed to build calendar feed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let document = ics::render_calendar(&analytics.calendar_events, state.clock.now());
    Ok((
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        document,
    ))
}

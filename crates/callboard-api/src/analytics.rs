// Planning analytics route

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;

use callboard_core::PlanningAnalytics;

use crate::auth::AuthedActor;
use crate::services::PlanningService;

/// App state for the analytics route
#[derive(Clone)]
pub struct AppState {
    pub planning: Arc<PlanningService>,
}

impl AppState {
    pub fn new(planning: Arc<PlanningService>) -> Self {
        Self { planning }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/planning/analytics", get(get_analytics))
        .with_state(state)
}

/// GET /v1/planning/analytics - The planning read model (planner only)
#[utoipa::path(
    get,
    path = "/v1/planning/analytics",
    responses(
        (status = 200, description = "Planning read model", body = PlanningAnalytics),
        (status = 401, description = "Missing or malformed actor identity"),
        (status = 403, description = "Actor is not a planner"),
        (status = 500, description = "Internal server error")
    ),
    tag = "planning"
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    AuthedActor(actor): AuthedActor,
) -> Result<Json<PlanningAnalytics>, StatusCode> {
    if !actor.is_planner() {
        return Err(StatusCode::FORBIDDEN);
    }

    let analytics = state.planning.read_model().await.map_err(|e| {
        tracing::error!("failed to build analytics: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(analytics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
    use axum::body::Body;
    use axum::http::Request;
    use callboard_core::SystemClock;
    use callboard_storage::Database;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_router() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool");
        let planning = PlanningService::new(
            Arc::new(Database::new(pool)),
            Arc::new(SystemClock),
        );
        routes(AppState::new(Arc::new(planning)))
    }

    #[tokio::test]
    async fn non_planners_get_403() {
        let request = Request::builder()
            .uri("/v1/planning/analytics")
            .header(ACTOR_ID_HEADER, Uuid::now_v7().to_string())
            .header(ACTOR_ROLE_HEADER, "reviewer")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn anonymous_requests_get_401() {
        let request = Request::builder()
            .uri("/v1/planning/analytics")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

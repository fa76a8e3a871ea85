// Callboard API server
// Decision: actor identity arrives from the fronting gateway as headers;
// scheduled jobs authenticate with a bearer token instead
// Decision: the analytics read model is computed once per request and shared
// by the dashboard JSON, the ICS feed, and the weekly digest

mod analytics;
mod auth;
mod calendar;
mod common;
mod events;
mod jobs;
mod services;
mod venues;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use callboard_core::{Clock, SystemClock};
use callboard_jobs::JobsConfig;
use callboard_storage::{Database, DbAuditObserver};

use crate::services::{EventService, PlanningService};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cron_auth: bool,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cron_auth: state.cron_auth,
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    cron_auth: bool,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        venues::create_venue,
        venues::get_venue,
        venues::create_area,
        venues::list_areas,
        events::create_event,
        events::list_events,
        events::get_event,
        events::list_versions,
        events::submit_event,
        events::clone_event,
        events::review_event,
        events::publish_event,
        events::complete_event,
        events::cancel_event,
        events::assign_reviewer,
        analytics::get_analytics,
        calendar::get_calendar,
        jobs::run_draft_reminders,
        jobs::run_sla_warnings,
        jobs::run_weekly_digest,
        jobs::run_publish_dispatch,
    ),
    components(
        schemas(
            callboard_core::Event,
            callboard_core::EventStatus,
            callboard_core::AreaRef,
            callboard_core::PlanningAnalytics,
            callboard_core::EventConflict,
            callboard_core::UpcomingEvent,
            callboard_core::AwaitingReviewerEvent,
            callboard_core::CalendarEventView,
            callboard_core::ReviewerSlaSnapshot,
            callboard_core::SlaBucket,
            callboard_jobs::JobSummary,
            events::CreateEventRequest,
            events::ReviewRequest,
            events::ReviewDecision,
            events::AssignReviewerRequest,
            events::EventVersion,
            venues::Venue,
            venues::VenueArea,
            venues::CreateVenueRequest,
            venues::CreateVenueAreaRequest,
            common::ListResponse<callboard_core::Event>,
            common::ListResponse<events::EventVersion>,
            common::ListResponse<venues::VenueArea>,
        )
    ),
    tags(
        (name = "venues", description = "Venue and area registry"),
        (name = "events", description = "Event lifecycle endpoints"),
        (name = "planning", description = "Analytics read model and calendar feed"),
        (name = "jobs", description = "Bearer-gated scheduled job endpoints")
    ),
    info(
        title = "Callboard API",
        version = "0.3.0",
        description = "Event planning pipeline: lifecycle, conflict analytics, reviewer SLA, reminders",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("callboard-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Connected to database");

    let db = Arc::new(db);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let audit = Arc::new(DbAuditObserver::new(db.as_ref().clone()));

    // Load configuration
    let auth_config = Arc::new(auth::AuthConfig::from_env());
    let jobs_config = Arc::new(JobsConfig::from_env());
    tracing::info!(
        cron_auth = auth_config.cron_enabled(),
        mailer = jobs_config.mailer_url.is_some(),
        publish_webhook = jobs_config.publish_webhook_url.is_some(),
        digest_recipients = jobs_config.digest_recipients.len(),
        "Configuration loaded"
    );

    // Create services and module states
    let event_service = Arc::new(EventService::new(db.clone(), audit, clock.clone()));
    let planning_service = Arc::new(PlanningService::new(db.clone(), clock.clone()));

    let venues_state = venues::AppState::new(db.clone());
    let events_state = events::AppState::new(event_service);
    let analytics_state = analytics::AppState::new(planning_service.clone());
    let calendar_state = calendar::AppState::new(planning_service, clock.clone());
    let jobs_state = jobs::AppState::new(db.clone(), auth_config.clone(), jobs_config, clock);
    let health_state = HealthState {
        cron_auth: auth_config.cron_enabled(),
    };

    // Load API prefix from environment (default: empty)
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    let api_routes = Router::new()
        .merge(venues::routes(venues_state))
        .merge(events::routes(events_state))
        .merge(analytics::routes(analytics_state))
        .merge(calendar::routes(calendar_state))
        .merge(jobs::routes(jobs_state));

    // Build main router with health (not prefixed) and prefixed API routes
    let mut app = Router::new().route("/health", get(health).with_state(health_state));
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/v1/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        // Route should work with prefix
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
    }
}

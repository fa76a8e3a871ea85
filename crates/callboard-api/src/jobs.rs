// Scheduled job endpoints
//
// External cron hits these with a bearer token. Each run re-derives its due
// work from current state, so invocations are idempotent and safe to overlap.
// Item failures still yield a 200 with counters; only a failed initial query
// is a 500.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use callboard_core::Clock;
use callboard_jobs::{
    draft_reminders, publish_dispatch, sla_warnings, weekly_digest, AlertSink, DisabledMailer,
    HttpAlertSink, HttpMailer, JobSummary, JobsConfig, Mailer, NullAlertSink, PublishWebhook,
};
use callboard_storage::Database;

use crate::auth::{require_cron_bearer, AuthConfig};

/// App state for the job endpoints
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth: Arc<AuthConfig>,
    pub jobs: Arc<JobsConfig>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        auth: Arc<AuthConfig>,
        jobs: Arc<JobsConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            auth,
            jobs,
            clock,
        }
    }

    fn mailer(&self) -> Box<dyn Mailer> {
        match HttpMailer::from_config(&self.jobs) {
            Ok(mailer) => Box::new(mailer),
            Err(_) => Box::new(DisabledMailer),
        }
    }

    fn alerts(&self) -> Box<dyn AlertSink> {
        match HttpAlertSink::from_config(&self.jobs) {
            Some(sink) => Box::new(sink),
            None => Box::new(NullAlertSink),
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/jobs/draft-reminders", get(run_draft_reminders))
        .route("/v1/jobs/sla-warnings", get(run_sla_warnings))
        .route("/v1/jobs/weekly-digest", get(run_weekly_digest))
        .route("/v1/jobs/publish-dispatch", get(run_publish_dispatch))
        .with_state(state)
}

fn job_response(job: &str, result: anyhow::Result<JobSummary>) -> Result<Json<JobSummary>, StatusCode> {
    match result {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            tracing::error!(job, error = %e, "job run failed before processing items");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /v1/jobs/draft-reminders - Nudge owners of stale drafts
#[utoipa::path(
    get,
    path = "/v1/jobs/draft-reminders",
    responses(
        (status = 200, description = "Run summary", body = JobSummary),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Initial query failed")
    ),
    tag = "jobs"
)]
pub async fn run_draft_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobSummary>, StatusCode> {
    require_cron_bearer(&headers, &state.auth)?;
    let result = draft_reminders::run(
        &state.db,
        state.mailer().as_ref(),
        state.alerts().as_ref(),
        state.clock.as_ref(),
    )
    .await;
    job_response("draft_reminders", result)
}

/// GET /v1/jobs/sla-warnings - Warn reviewers about due and overdue events
#[utoipa::path(
    get,
    path = "/v1/jobs/sla-warnings",
    responses(
        (status = 200, description = "Run summary", body = JobSummary),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Initial query failed")
    ),
    tag = "jobs"
)]
pub async fn run_sla_warnings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobSummary>, StatusCode> {
    require_cron_bearer(&headers, &state.auth)?;
    let result = sla_warnings::run(
        &state.db,
        state.mailer().as_ref(),
        state.alerts().as_ref(),
        state.clock.as_ref(),
    )
    .await;
    job_response("sla_warnings", result)
}

/// GET /v1/jobs/weekly-digest - Mail the planning snapshot to the team
#[utoipa::path(
    get,
    path = "/v1/jobs/weekly-digest",
    responses(
        (status = 200, description = "Run summary", body = JobSummary),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Initial query failed")
    ),
    tag = "jobs"
)]
pub async fn run_weekly_digest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobSummary>, StatusCode> {
    require_cron_bearer(&headers, &state.auth)?;
    let result = weekly_digest::run(
        &state.db,
        state.mailer().as_ref(),
        state.alerts().as_ref(),
        state.clock.as_ref(),
        &state.jobs.digest_recipients,
    )
    .await;
    job_response("weekly_digest", result)
}

/// GET /v1/jobs/publish-dispatch - Drain queued publish dispatches
#[utoipa::path(
    get,
    path = "/v1/jobs/publish-dispatch",
    responses(
        (status = 200, description = "Run summary", body = JobSummary),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Initial query failed or webhook unconfigured")
    ),
    tag = "jobs"
)]
pub async fn run_publish_dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobSummary>, StatusCode> {
    require_cron_bearer(&headers, &state.auth)?;
    let webhook = PublishWebhook::from_config(&state.jobs).map_err(|e| {
        tracing::error!(error = %e, "publish dispatch misconfigured");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let result =
        publish_dispatch::run(&state.db, &webhook, state.alerts().as_ref(), state.clock.as_ref())
            .await;
    job_response("publish_dispatch", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_cron_token;
    use axum::body::Body;
    use axum::http::Request;
    use callboard_core::SystemClock;
    use tower::ServiceExt;

    // connect_lazy never touches the network until a query runs, so the auth
    // paths (which reject before any query) are testable without Postgres
    fn test_router() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool");
        let state = AppState::new(
            Arc::new(Database::new(pool)),
            Arc::new(AuthConfig {
                cron_token_hash: Some(hash_cron_token("s3cret")),
            }),
            Arc::new(JobsConfig::default()),
            Arc::new(SystemClock),
        );
        routes(state)
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let builder = Request::builder().uri("/v1/jobs/sla-warnings");
        let builder = match token {
            Some(t) => builder.header("authorization", format!("Bearer {t}")),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_or_wrong_bearer_is_401() {
        let response = test_router().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_router().oneshot(request(Some("nope"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn failed_initial_query_is_500() {
        // Valid token passes auth, then the unreachable database fails the
        // initial query, which is the one hard failure of a job run
        let response = test_router()
            .oneshot(request(Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

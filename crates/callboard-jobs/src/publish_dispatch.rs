// Publish dispatch job
//
// Approved events queue an `ai_publish` notification when a planner publishes
// them; this job drains the queue, posting each event to the downstream
// publishing webhook. Failed dispatches back off exponentially and are
// cancelled after the retry budget is spent.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use callboard_core::reminders::{publish_retry_after, MAX_PUBLISH_RETRIES};
use callboard_core::{Clock, NotificationKind};
use callboard_storage::{Database, NotificationRow};

use crate::alerts::AlertSink;
use crate::config::JobsConfig;
use crate::delivery::{mark_cancelled, mark_failed, mark_sent, Outcome};
use crate::summary::JobSummary;

const JOB_NAME: &str = "publish_dispatch";

#[derive(Debug, Clone, Serialize)]
struct DispatchBody {
    event_id: Uuid,
    dispatched_at: DateTime<Utc>,
}

/// Client for the downstream publishing webhook
pub struct PublishWebhook {
    client: reqwest::Client,
    url: String,
}

impl PublishWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        PublishWebhook {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &JobsConfig) -> Result<Self> {
        let url = config
            .publish_webhook_url
            .clone()
            .context("PUBLISH_WEBHOOK_URL not configured")?;
        Ok(PublishWebhook::new(url))
    }

    pub async fn dispatch(&self, event_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let body = DispatchBody {
            event_id,
            dispatched_at: at,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("publish webhook request failed")?;
        if !response.status().is_success() {
            bail!("publish webhook returned {}", response.status());
        }
        Ok(())
    }
}

pub async fn run(
    db: &Database,
    webhook: &PublishWebhook,
    alerts: &dyn AlertSink,
    clock: &dyn Clock,
) -> Result<JobSummary> {
    let now = clock.now();
    let kind = NotificationKind::AiPublish.to_string();

    let due = db.list_due_notifications(&kind, now).await?;

    let mut summary = JobSummary::default();
    for row in &due {
        summary.processed += 1;
        match process_one(db, webhook, clock, row).await {
            Ok(Outcome::Dispatched) => summary.dispatched += 1,
            Ok(Outcome::Queued) => summary.queued += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Failed) => summary.failed += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(notification_id = %row.id, error = %e, "publish dispatch item failed");
            }
        }
    }

    if summary.has_failures() {
        alerts
            .alert(
                JOB_NAME,
                &format!(
                    "{} of {} dispatches failed",
                    summary.failed, summary.processed
                ),
                "see logs for per-notification errors",
            )
            .await;
    }

    tracing::info!(?summary, "publish dispatch run complete");
    Ok(summary)
}

async fn process_one(
    db: &Database,
    webhook: &PublishWebhook,
    clock: &dyn Clock,
    row: &NotificationRow,
) -> Result<Outcome> {
    let now = clock.now();
    let payload = row.parsed_payload()?;
    let prior_meta = payload.send_meta.clone();

    match webhook.dispatch(payload.event_id, now).await {
        Ok(()) => {
            mark_sent(db, row.id, payload.event_id, &prior_meta, now).await?;
            Ok(Outcome::Dispatched)
        }
        Err(e) => {
            let retries_spent = prior_meta.retry_count + 1;
            if retries_spent > MAX_PUBLISH_RETRIES {
                tracing::warn!(
                    notification_id = %row.id,
                    event_id = %payload.event_id,
                    "publish dispatch cancelled after retry budget"
                );
                mark_cancelled(db, row.id, payload.event_id, &prior_meta, now, &e.to_string())
                    .await?;
            } else {
                let retry_at = publish_retry_after(prior_meta.retry_count, now);
                mark_failed(
                    db,
                    row.id,
                    payload.event_id,
                    &prior_meta,
                    now,
                    &e.to_string(),
                    Some(retry_at),
                )
                .await?;
            }
            Ok(Outcome::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn dispatch_posts_event_reference() {
        let server = MockServer::start().await;
        let event_id = Uuid::now_v7();
        Mock::given(method("POST"))
            .and(path("/publish"))
            .and(body_partial_json(serde_json::json!({
                "event_id": event_id,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let webhook = PublishWebhook::new(format!("{}/publish", server.uri()));
        webhook
            .dispatch(event_id, "2025-05-01T00:00:00Z".parse().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn webhook_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let webhook = PublishWebhook::new(server.uri());
        let err = webhook
            .dispatch(Uuid::now_v7(), "2025-05-01T00:00:00Z".parse().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}

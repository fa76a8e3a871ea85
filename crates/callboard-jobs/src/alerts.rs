// Side-channel alerting
//
// Raised after a job loop when any item failed. Fire-and-forget: a failing
// alert post is logged and swallowed, never surfaced to the job caller.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::JobsConfig;

#[derive(Debug, Clone, Serialize)]
struct AlertBody<'a> {
    job: &'a str,
    message: &'a str,
    detail: &'a str,
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Raise an alert with enough context to triage without replaying the run
    async fn alert(&self, job: &str, message: &str, detail: &str);
}

/// Posts alerts to a webhook
pub struct HttpAlertSink {
    client: reqwest::Client,
    url: String,
}

impl HttpAlertSink {
    pub fn new(url: impl Into<String>) -> Self {
        HttpAlertSink {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &JobsConfig) -> Option<Self> {
        config.alert_webhook_url.clone().map(HttpAlertSink::new)
    }
}

#[async_trait]
impl AlertSink for HttpAlertSink {
    async fn alert(&self, job: &str, message: &str, detail: &str) {
        let body = AlertBody { job, message, detail };
        let result = self.client.post(&self.url).json(&body).send().await;
        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(job, status = %response.status(), "alert webhook rejected alert");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(job, error = %e, "alert webhook unreachable");
            }
        }
    }
}

/// Sink that only logs; used when no webhook is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAlertSink;

#[async_trait]
impl AlertSink for NullAlertSink {
    async fn alert(&self, job: &str, message: &str, detail: &str) {
        tracing::warn!(job, message, detail, "job alert (no webhook configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_alert_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "job": "sla_warnings",
                "message": "2 items failed",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpAlertSink::new(server.uri());
        sink.alert("sla_warnings", "2 items failed", "smtp 451").await;
    }

    #[tokio::test]
    async fn unreachable_webhook_is_swallowed() {
        let sink = HttpAlertSink::new("http://127.0.0.1:1/unreachable");
        // Must not panic or propagate
        sink.alert("draft_reminders", "1 item failed", "boom").await;
    }
}

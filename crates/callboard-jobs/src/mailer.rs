// Outbound mail
//
// Delivery is at-least-once: the jobs mark attempts in the notifications
// table and a later run retries failures, so the mailer itself only needs to
// report success or failure for a single attempt.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;

use crate::config::JobsConfig;

/// One outbound email. `to` is a user id or address; the mail service owns
/// address resolution.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Mailer that posts messages to an email API endpoint
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpMailer {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        HttpMailer {
            client: reqwest::Client::new(),
            url: url.into(),
            token,
        }
    }

    pub fn from_config(config: &JobsConfig) -> Result<Self> {
        let url = config
            .mailer_url
            .clone()
            .context("MAILER_URL not configured")?;
        Ok(HttpMailer::new(url, config.mailer_token.clone()))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.client.post(&self.url).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.context("mail request failed")?;
        if !response.status().is_success() {
            bail!("mail API returned {}", response.status());
        }
        Ok(())
    }
}

/// Mailer used when no MAILER_URL is configured; every send fails, so items
/// are recorded as failed and retried once mail is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        bail!("mailer not configured; dropping send to {}", message.to)
    }
}

/// In-memory mailer for tests and local development
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail_to: Option<String>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        MemoryMailer::default()
    }

    /// Fail every send addressed to the given recipient
    pub fn failing_for(recipient: impl Into<String>) -> Self {
        MemoryMailer {
            sent: Mutex::new(Vec::new()),
            fail_to: Some(recipient.into()),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail_to.as_deref() == Some(message.to.as_str()) {
            bail!("simulated delivery failure to {}", message.to);
        }
        self.sent.lock().expect("mailer lock").push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> EmailMessage {
        EmailMessage {
            to: "reviewer-1".into(),
            to_name: "Alice".into(),
            subject: "Review due".into(),
            body: "An event needs your review.".into(),
        }
    }

    #[tokio::test]
    async fn posts_message_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer sekrit"))
            .and(body_partial_json(serde_json::json!({
                "to": "reviewer-1",
                "subject": "Review due",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(format!("{}/send", server.uri()), Some("sekrit".into()));
        mailer.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(server.uri(), None);
        let err = mailer.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn memory_mailer_records_and_fails_on_request() {
        let mailer = MemoryMailer::failing_for("reviewer-2");
        mailer.send(&message()).await.unwrap();
        let mut bad = message();
        bad.to = "reviewer-2".into();
        assert!(mailer.send(&bad).await.is_err());
        assert_eq!(mailer.sent().len(), 1);
    }
}

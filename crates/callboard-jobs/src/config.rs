// Job configuration from environment

/// Environment-driven configuration for the batch jobs
#[derive(Debug, Clone, Default)]
pub struct JobsConfig {
    /// Email API endpoint; when unset, mail sends fail and items requeue
    pub mailer_url: Option<String>,
    /// Bearer token for the email API
    pub mailer_token: Option<String>,
    /// Webhook receiving aggregate failure alerts
    pub alert_webhook_url: Option<String>,
    /// Webhook receiving approved-event publish dispatches
    pub publish_webhook_url: Option<String>,
    /// Weekly digest recipients (comma-separated user ids or addresses)
    pub digest_recipients: Vec<String>,
}

impl JobsConfig {
    pub fn from_env() -> Self {
        JobsConfig {
            mailer_url: non_empty(std::env::var("MAILER_URL").ok()),
            mailer_token: non_empty(std::env::var("MAILER_TOKEN").ok()),
            alert_webhook_url: non_empty(std::env::var("ALERT_WEBHOOK_URL").ok()),
            publish_webhook_url: non_empty(std::env::var("PUBLISH_WEBHOOK_URL").ok()),
            digest_recipients: std::env::var("DIGEST_RECIPIENTS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_read_as_unset() {
        assert_eq!(non_empty(Some("".into())), None);
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
    }
}

// Authentication configuration

use crate::auth::cron::hash_cron_token;

/// Auth settings loaded from the environment
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// SHA-256 of the cron bearer token; `None` locks the job endpoints
    pub cron_token_hash: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let cron_token_hash = std::env::var("CRON_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| hash_cron_token(&s));

        if cron_token_hash.is_none() {
            tracing::warn!("CRON_SECRET not set; scheduled job endpoints will reject all callers");
        }

        AuthConfig { cron_token_hash }
    }

    pub fn cron_enabled(&self) -> bool {
        self.cron_token_hash.is_some()
    }
}

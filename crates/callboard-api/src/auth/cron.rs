// Cron bearer-token check
// Decision: only the SHA-256 of the token is held in memory and compared,
// so the raw secret never appears in state dumps or logs

use axum::http::{header, HeaderMap, StatusCode};
use sha2::{Digest, Sha256};

use crate::auth::AuthConfig;

/// Hash a cron token for storage/comparison
pub fn hash_cron_token(token: &str) -> String {
    let hash = Sha256::digest(token.as_bytes());
    hex::encode(hash)
}

/// Require a valid `Authorization: Bearer <token>` header; 401 otherwise
pub fn require_cron_bearer(headers: &HeaderMap, config: &AuthConfig) -> Result<(), StatusCode> {
    let Some(expected) = &config.cron_token_hash else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if hash_cron_token(presented) == *expected {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            cron_token_hash: secret.map(hash_cron_token),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_token_passes() {
        assert!(require_cron_bearer(&bearer("s3cret"), &config(Some("s3cret"))).is_ok());
    }

    #[test]
    fn wrong_or_missing_token_is_401() {
        let cfg = config(Some("s3cret"));
        assert_eq!(
            require_cron_bearer(&bearer("other"), &cfg).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            require_cron_bearer(&HeaderMap::new(), &cfg).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(
            require_cron_bearer(&headers, &cfg).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unconfigured_secret_rejects_everyone() {
        assert_eq!(
            require_cron_bearer(&bearer("anything"), &config(None)).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }
}

// Request authentication plumbing
//
// Authentication itself happens upstream: a gateway terminates sessions and
// forwards the verified actor identity in headers. This module extracts that
// identity, gates planner-only surfaces, and checks the bearer token cron
// schedulers must present on the job endpoints.

mod config;
mod cron;

pub use config::AuthConfig;
pub use cron::{hash_cron_token, require_cron_bearer};

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap, StatusCode};
use std::str::FromStr;
use uuid::Uuid;

use callboard_core::{Actor, ActorRole};

/// Gateway headers carrying the verified actor identity
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_VENUE_HEADER: &str = "x-actor-venue";

/// Extractor wrapper around the domain actor
#[derive(Debug, Clone)]
pub struct AuthedActor(pub Actor);

/// Build an actor from the gateway headers; 401 when absent or malformed
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, StatusCode> {
    let id = header_str(headers, ACTOR_ID_HEADER)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let role = header_str(headers, ACTOR_ROLE_HEADER)
        .and_then(|s| ActorRole::from_str(s).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let venue_id = header_str(headers, ACTOR_VENUE_HEADER).and_then(|s| Uuid::parse_str(s).ok());

    Ok(Actor { id, role, venue_id })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthedActor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(AuthedActor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            map.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        map
    }

    #[test]
    fn extracts_planner_actor() {
        let id = Uuid::now_v7();
        let actor = actor_from_headers(&headers(Some(&id.to_string()), Some("planner"))).unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.role, ActorRole::Planner);
        assert_eq!(actor.venue_id, None);
    }

    #[test]
    fn missing_or_bad_identity_is_unauthorized() {
        let id = Uuid::now_v7().to_string();
        assert_eq!(
            actor_from_headers(&headers(None, Some("planner"))).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            actor_from_headers(&headers(Some(&id), None)).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            actor_from_headers(&headers(Some("not-a-uuid"), Some("planner"))).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            actor_from_headers(&headers(Some(&id), Some("admin"))).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn venue_manager_carries_venue() {
        let id = Uuid::now_v7();
        let venue = Uuid::now_v7();
        let mut map = headers(Some(&id.to_string()), Some("venue_manager"));
        map.insert(
            ACTOR_VENUE_HEADER,
            HeaderValue::from_str(&venue.to_string()).unwrap(),
        );
        let actor = actor_from_headers(&map).unwrap();
        assert_eq!(actor.venue_id, Some(venue));
    }
}

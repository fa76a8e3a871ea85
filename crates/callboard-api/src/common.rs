// Shared API plumbing

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use callboard_core::LifecycleError;

/// Standard list envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        ListResponse { items, total }
    }
}

/// Map a lifecycle error onto an HTTP status, logging server-side faults
pub fn lifecycle_status(context: &str, e: LifecycleError) -> StatusCode {
    let status = match &e {
        LifecycleError::IllegalTransition { .. } | LifecycleError::VersionConflict { .. } => {
            StatusCode::CONFLICT
        }
        LifecycleError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        LifecycleError::EventNotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::MissingStart
        | LifecycleError::UnknownStatus(_)
        | LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{context}: {e}");
    } else {
        tracing::debug!("{context}: {e}");
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::EventStatus;
    use uuid::Uuid;

    #[test]
    fn maps_domain_errors_to_statuses() {
        assert_eq!(
            lifecycle_status(
                "t",
                LifecycleError::IllegalTransition {
                    from: EventStatus::Approved,
                    to: EventStatus::Submitted,
                }
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            lifecycle_status("t", LifecycleError::not_authorized("x")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            lifecycle_status("t", LifecycleError::EventNotFound(Uuid::now_v7())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            lifecycle_status("t", LifecycleError::Validation("bad".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            lifecycle_status("t", LifecycleError::Internal(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

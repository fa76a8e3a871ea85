// Job run summary

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Counters returned by every batch job.
///
/// `processed` counts items examined, `queued` counts freshly created
/// notification rows, `dispatched` counts successful deliveries, `skipped`
/// counts dedup/backoff suppressions, `failed` counts per-item failures
/// (which never abort the run).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct JobSummary {
    pub processed: u32,
    pub dispatched: u32,
    pub queued: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl JobSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_all_counters() {
        let summary = JobSummary {
            processed: 5,
            dispatched: 3,
            queued: 2,
            skipped: 1,
            failed: 1,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["processed"], 5);
        assert_eq!(json["dispatched"], 3);
        assert_eq!(json["queued"], 2);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["failed"], 1);
        assert!(summary.has_failures());
    }
}

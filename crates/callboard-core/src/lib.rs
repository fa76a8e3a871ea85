// Core domain for the event planning pipeline
//
// Everything here is pure: no database handles, no HTTP, no wall-clock reads.
// Time comes in through the Clock trait, state comes in as plain values, and
// the API/storage/jobs crates glue the results to the outside world.

pub mod analytics;
pub mod audit;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod event;
pub mod ics;
pub mod notification;
pub mod reminders;
pub mod resource;
pub mod sla;

pub use analytics::{
    build_analytics, AwaitingReviewerEvent, CalendarEventView, PlanningAnalytics, UpcomingEvent,
};
pub use audit::{AuditEntry, AuditObserver, NullAuditObserver};
pub use clock::{Clock, FixedClock, SystemClock};
pub use conflict::{detect_conflicts, resolve_bounds, EventConflict, DEFAULT_DURATION_MS};
pub use error::{LifecycleError, Result};
pub use event::{Actor, ActorRole, AreaRef, Event, EventStatus, VersionSnapshot};
pub use notification::{NotificationKind, NotificationPayload, NotificationStatus, SendMeta};
pub use reminders::{evaluate_dedup, DedupDecision, ExistingNotification, SkipReason};
pub use resource::{bucket_keys, Bucket, ReservedResource};
pub use sla::{classify_days_until_start, diff_days, reviewer_sla, ReviewerSlaSnapshot, SlaBucket};

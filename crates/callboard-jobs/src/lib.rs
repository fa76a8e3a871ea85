// Scheduled batch processors for the event pipeline
//
// Each job shares one shape: query the bounded set of due work (a failure
// here fails the run), process items sequentially with per-item error
// isolation, persist retry state on each attempt, return a summary, and raise
// a side-channel alert if any item failed.

pub mod alerts;
pub mod config;
pub(crate) mod delivery;
pub mod draft_reminders;
pub mod mailer;
pub mod publish_dispatch;
pub mod sla_warnings;
pub mod summary;
pub mod weekly_digest;

pub use alerts::{AlertSink, HttpAlertSink, NullAlertSink};
pub use config::JobsConfig;
pub use mailer::{DisabledMailer, EmailMessage, HttpMailer, Mailer, MemoryMailer};
pub use publish_dispatch::PublishWebhook;
pub use summary::JobSummary;

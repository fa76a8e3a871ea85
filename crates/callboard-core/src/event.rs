// Event domain types and lifecycle state machine
//
// These types represent the Event entity, its status machine, and the actors
// that drive it. Used by both API and jobs crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::LifecycleError;
use crate::resource::ReservedResource;

/// Event status
///
/// Legal transitions:
/// `draft → submitted → {needs_revisions, approved} → published → completed`,
/// `needs_revisions → submitted` for resubmission, `rejected` from any
/// pre-published state, `cancelled` from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Submitted,
    NeedsRevisions,
    Approved,
    Rejected,
    Published,
    Completed,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Draft => "draft",
            EventStatus::Submitted => "submitted",
            EventStatus::NeedsRevisions => "needs_revisions",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
            EventStatus::Published => "published",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for EventStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "submitted" => Ok(EventStatus::Submitted),
            "needs_revisions" => Ok(EventStatus::NeedsRevisions),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            "published" => Ok(EventStatus::Published),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

impl EventStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventStatus::Completed | EventStatus::Rejected | EventStatus::Cancelled
        )
    }

    /// States an event passes through before publication
    pub fn is_pre_published(self) -> bool {
        matches!(
            self,
            EventStatus::Draft
                | EventStatus::Submitted
                | EventStatus::NeedsRevisions
                | EventStatus::Approved
        )
    }

    /// Single source of truth for the lifecycle state machine
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        match (self, next) {
            (Draft, Submitted) | (NeedsRevisions, Submitted) => true,
            (Submitted, NeedsRevisions) | (Submitted, Approved) => true,
            (Approved, Published) => true,
            (Published, Completed) => true,
            (from, Rejected) => from.is_pre_published(),
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Validate a transition, returning the lifecycle error on refusal
    pub fn transition_to(self, next: EventStatus) -> crate::Result<EventStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LifecycleError::IllegalTransition { from: self, to: next })
        }
    }
}

/// Actor role, as asserted by the fronting gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    VenueManager,
    Reviewer,
    Planner,
}

impl std::str::FromStr for ActorRole {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venue_manager" => Ok(ActorRole::VenueManager),
            "reviewer" => Ok(ActorRole::Reviewer),
            "planner" => Ok(ActorRole::Planner),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

/// Authenticated actor performing a lifecycle action
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
    /// Venue the actor manages, when role is `venue_manager`
    pub venue_id: Option<Uuid>,
}

impl Actor {
    pub fn is_planner(&self) -> bool {
        self.role == ActorRole::Planner
    }

    /// Create draft: venue manager for their own venue, or any planner
    pub fn can_create_for(&self, venue_id: Uuid) -> bool {
        match self.role {
            ActorRole::Planner => true,
            ActorRole::VenueManager => self.venue_id == Some(venue_id),
            ActorRole::Reviewer => false,
        }
    }

    /// Submit: the event's owner, or any planner
    pub fn can_submit(&self, created_by: Uuid) -> bool {
        self.is_planner() || self.id == created_by
    }

    /// Review decisions: reviewers and planners
    pub fn can_review(&self) -> bool {
        matches!(self.role, ActorRole::Reviewer | ActorRole::Planner)
    }
}

/// A named physical area within a venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AreaRef {
    pub id: Uuid,
    pub name: String,
}

/// Event entity
///
/// An event reserves either a set of explicit areas or a single labelled
/// space; a missing end time implies a default 2-hour duration for conflict
/// purposes; an event with no start time is never conflict-checked or fed to
/// the calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub venue_id: Uuid,
    pub venue_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_space: Option<String>,
    #[serde(default)]
    pub areas: Vec<AreaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Resource the event reserves, for conflict bucketing
    pub fn reserved_resource(&self) -> ReservedResource {
        if self.areas.is_empty() {
            ReservedResource::NamedSpace(self.venue_space.clone())
        } else {
            ReservedResource::Areas(self.areas.clone())
        }
    }
}

/// Immutable snapshot payload stored with each event version
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VersionSnapshot {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_space: Option<String>,
    #[serde(default)]
    pub area_ids: Vec<Uuid>,
    /// Provenance, set when the version was created by cloning another event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_from: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_at: Option<DateTime<Utc>>,
}

impl VersionSnapshot {
    /// Snapshot the curated subset of an event's fields
    pub fn of(event: &Event) -> Self {
        VersionSnapshot {
            title: event.title.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            venue_space: event.venue_space.clone(),
            area_ids: event.areas.iter().map(|a| a.id).collect(),
            cloned_from: None,
            cloned_at: None,
        }
    }

    /// Snapshot for a clone, tagged with provenance
    pub fn cloned(event: &Event, from: Uuid, at: DateTime<Utc>) -> Self {
        VersionSnapshot {
            cloned_from: Some(from),
            cloned_at: Some(at),
            ..VersionSnapshot::of(event)
        }
    }
}

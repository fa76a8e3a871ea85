// Event lifecycle service
//
// Drives the state machine against storage. The event row and its version
// row are the only pair with both-or-neither semantics: a failed version
// write compensates a creation by deleting the new event. Audit writes are
// best-effort and never fail the operation.

use std::sync::Arc;
use uuid::Uuid;

use callboard_core::{
    Actor, AuditEntry, AuditObserver, Clock, Event, EventStatus, LifecycleError, Result,
    VersionSnapshot,
};
use callboard_storage::{CreateEventRow, CreateNotification, Database, EventVersionRow};

use crate::events::{CreateEventRequest, ReviewDecision};

pub struct EventService {
    db: Arc<Database>,
    audit: Arc<dyn AuditObserver>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(db: Arc<Database>, audit: Arc<dyn AuditObserver>, clock: Arc<dyn Clock>) -> Self {
        Self { db, audit, clock }
    }

    /// Create a draft with version #1; compensates by deleting the event if
    /// the version write fails.
    pub async fn create(&self, actor: &Actor, req: CreateEventRequest) -> Result<Event> {
        if !actor.can_create_for(req.venue_id) {
            return Err(LifecycleError::not_authorized("create events for this venue"));
        }
        if req.title.trim().is_empty() {
            return Err(LifecycleError::Validation("title must not be empty".into()));
        }
        if self.db.get_venue(req.venue_id).await?.is_none() {
            return Err(LifecycleError::Validation("unknown venue".into()));
        }
        if !req.area_ids.is_empty() {
            let known = self.db.list_venue_areas(req.venue_id).await?;
            for area_id in &req.area_ids {
                if !known.iter().any(|a| a.id == *area_id) {
                    return Err(LifecycleError::Validation(format!(
                        "area {area_id} does not belong to this venue"
                    )));
                }
            }
        }

        let row = self
            .db
            .create_event(CreateEventRow {
                title: req.title,
                description: req.description,
                starts_at: req.starts_at,
                ends_at: req.ends_at,
                venue_id: req.venue_id,
                venue_space: req.venue_space,
                created_by: actor.id,
            })
            .await?;
        let event_id = row.id;

        let finish = async {
            self.db.set_event_areas(event_id, &req.area_ids).await?;
            let areas = self.db.area_refs_for_event(event_id).await?;
            let event = row.into_event(areas)?;
            let payload = serde_json::to_value(VersionSnapshot::of(&event))
                .map_err(anyhow::Error::from)?;
            self.db
                .append_next_version(event_id, payload, None, None)
                .await?;
            anyhow::Ok(event)
        };

        match finish.await {
            Ok(event) => {
                self.audit_event(actor, "event.create", event.id, serde_json::json!({}))
                    .await;
                Ok(event)
            }
            Err(e) => {
                // No event without version history: undo the creation
                tracing::error!(event_id = %event_id, error = %e, "version write failed, compensating");
                if let Err(del) = self.db.delete_event(event_id).await {
                    tracing::error!(event_id = %event_id, error = %del, "compensating delete failed");
                }
                Err(LifecycleError::Internal(e))
            }
        }
    }

    /// Submit a draft (or revised draft) for review.
    ///
    /// The new version number is max(existing) + 1, claimed under a unique
    /// constraint so racing submissions cannot double-write. If the version
    /// write fails after the status update, the operation reports failure and
    /// the status update stands.
    pub async fn submit(&self, actor: &Actor, event_id: Uuid) -> Result<Event> {
        let event = self.load(event_id).await?;
        if !actor.can_submit(event.created_by) {
            return Err(LifecycleError::not_authorized("submit this event"));
        }
        event.status.transition_to(EventStatus::Submitted)?;

        let updated = self
            .db
            .update_event_status(event_id, &EventStatus::Submitted.to_string())
            .await?
            .ok_or(LifecycleError::EventNotFound(event_id))?;
        let areas = self.db.area_refs_for_event(event_id).await?;
        let updated = updated.into_event(areas)?;

        let now = self.clock.now();
        let payload =
            serde_json::to_value(VersionSnapshot::of(&updated)).map_err(anyhow::Error::from)?;
        let version = self
            .db
            .append_next_version(event_id, payload, Some(now), Some(actor.id))
            .await?;

        self.audit_event(
            actor,
            "event.submit",
            event_id,
            serde_json::json!({ "version": version.version }),
        )
        .await;
        Ok(updated)
    }

    /// Clone an event into a fresh draft with provenance-tagged version #1.
    pub async fn clone_event(&self, actor: &Actor, source_id: Uuid) -> Result<Event> {
        if !actor.is_planner() {
            return Err(LifecycleError::not_authorized("clone events"));
        }
        let source = self.load(source_id).await?;

        let row = self
            .db
            .create_event(CreateEventRow {
                title: source.title.clone(),
                description: source.description.clone(),
                starts_at: source.starts_at,
                ends_at: source.ends_at,
                venue_id: source.venue_id,
                venue_space: source.venue_space.clone(),
                created_by: actor.id,
            })
            .await?;
        let new_id = row.id;
        let area_ids: Vec<Uuid> = source.areas.iter().map(|a| a.id).collect();

        let finish = async {
            self.db.set_event_areas(new_id, &area_ids).await?;
            let areas = self.db.area_refs_for_event(new_id).await?;
            let event = row.into_event(areas)?;
            let snapshot = VersionSnapshot::cloned(&event, source_id, self.clock.now());
            let payload = serde_json::to_value(snapshot).map_err(anyhow::Error::from)?;
            self.db.append_next_version(new_id, payload, None, None).await?;
            anyhow::Ok(event)
        };

        match finish.await {
            Ok(event) => {
                self.audit_event(
                    actor,
                    "event.clone",
                    event.id,
                    serde_json::json!({ "cloned_from": source_id }),
                )
                .await;
                Ok(event)
            }
            Err(e) => {
                tracing::error!(event_id = %new_id, error = %e, "clone version write failed, compensating");
                if let Err(del) = self.db.delete_event(new_id).await {
                    tracing::error!(event_id = %new_id, error = %del, "compensating delete failed");
                }
                Err(LifecycleError::Internal(e))
            }
        }
    }

    /// Record a review decision on a submitted event.
    pub async fn review(
        &self,
        actor: &Actor,
        event_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<Event> {
        if !actor.can_review() {
            return Err(LifecycleError::not_authorized("review events"));
        }
        let next = match decision {
            ReviewDecision::Approved => EventStatus::Approved,
            ReviewDecision::NeedsRevisions => EventStatus::NeedsRevisions,
            ReviewDecision::Rejected => EventStatus::Rejected,
        };
        let event = self
            .transition(actor, event_id, next, "event.review")
            .await?;
        Ok(event)
    }

    /// Publish an approved event and queue its downstream dispatch.
    pub async fn publish(&self, actor: &Actor, event_id: Uuid) -> Result<Event> {
        if !actor.is_planner() {
            return Err(LifecycleError::not_authorized("publish events"));
        }
        let event = self
            .transition(actor, event_id, EventStatus::Published, "event.publish")
            .await?;

        // Queue the publish dispatch for the batch job to deliver. Best-effort:
        // the publish itself already stands, so a failed enqueue is logged and
        // left to manual re-queue rather than failing the caller.
        let payload = callboard_core::NotificationPayload {
            event_id,
            send_meta: Default::default(),
        };
        let enqueue = async {
            self.db
                .insert_notification(CreateNotification {
                    kind: callboard_core::NotificationKind::AiPublish.to_string(),
                    target_user: actor.id,
                    payload: serde_json::to_value(&payload).map_err(anyhow::Error::from)?,
                    due_at: self.clock.now(),
                })
                .await?;
            anyhow::Ok(())
        };
        if let Err(e) = enqueue.await {
            tracing::error!(event_id = %event_id, error = %e, "failed to queue publish dispatch");
        }

        Ok(event)
    }

    pub async fn complete(&self, actor: &Actor, event_id: Uuid) -> Result<Event> {
        if !actor.is_planner() {
            return Err(LifecycleError::not_authorized("complete events"));
        }
        self.transition(actor, event_id, EventStatus::Completed, "event.complete")
            .await
    }

    pub async fn cancel(&self, actor: &Actor, event_id: Uuid) -> Result<Event> {
        if !actor.is_planner() {
            return Err(LifecycleError::not_authorized("cancel events"));
        }
        self.transition(actor, event_id, EventStatus::Cancelled, "event.cancel")
            .await
    }

    /// Assign a reviewer; allowed while the event is still in flight.
    pub async fn assign_reviewer(
        &self,
        actor: &Actor,
        event_id: Uuid,
        reviewer_id: Uuid,
        reviewer_name: &str,
    ) -> Result<Event> {
        if !actor.is_planner() {
            return Err(LifecycleError::not_authorized("assign reviewers"));
        }
        let event = self.load(event_id).await?;
        if event.status.is_terminal() {
            return Err(LifecycleError::Validation(
                "cannot assign a reviewer to a closed event".into(),
            ));
        }

        let updated = self
            .db
            .set_event_reviewer(event_id, reviewer_id, reviewer_name)
            .await?
            .ok_or(LifecycleError::EventNotFound(event_id))?;
        let areas = self.db.area_refs_for_event(event_id).await?;
        let updated = updated.into_event(areas)?;

        self.audit_event(
            actor,
            "event.assign_reviewer",
            event_id,
            serde_json::json!({ "reviewer_id": reviewer_id }),
        )
        .await;
        Ok(updated)
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Option<Event>> {
        match self.db.get_event(event_id).await? {
            Some(row) => {
                let areas = self.db.area_refs_for_event(event_id).await?;
                Ok(Some(row.into_event(areas)?))
            }
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.db.load_events_with_areas().await?)
    }

    pub async fn versions(&self, event_id: Uuid) -> Result<Vec<EventVersionRow>> {
        self.load(event_id).await?;
        Ok(self.db.list_event_versions(event_id).await?)
    }

    async fn load(&self, event_id: Uuid) -> Result<Event> {
        self.get(event_id)
            .await?
            .ok_or(LifecycleError::EventNotFound(event_id))
    }

    async fn transition(
        &self,
        actor: &Actor,
        event_id: Uuid,
        next: EventStatus,
        action: &str,
    ) -> Result<Event> {
        let event = self.load(event_id).await?;
        event.status.transition_to(next)?;

        let updated = self
            .db
            .update_event_status(event_id, &next.to_string())
            .await?
            .ok_or(LifecycleError::EventNotFound(event_id))?;
        let areas = self.db.area_refs_for_event(event_id).await?;
        let updated = updated.into_event(areas)?;

        self.audit_event(
            actor,
            action,
            event_id,
            serde_json::json!({ "from": event.status.to_string(), "to": next.to_string() }),
        )
        .await;
        Ok(updated)
    }

    async fn audit_event(
        &self,
        actor: &Actor,
        action: &str,
        event_id: Uuid,
        details: serde_json::Value,
    ) {
        self.audit
            .record(AuditEntry::for_event(
                actor.id,
                action,
                event_id,
                details,
                self.clock.now(),
            ))
            .await;
    }
}

// Planning read-model service
//
// Loads one event snapshot and derives the full analytics read model from it.
// The dashboard JSON, the ICS feed, and the weekly digest all consume this
// single computation; nothing re-derives conflicts or SLA state separately.

use std::sync::Arc;

use anyhow::Result;
use callboard_core::{build_analytics, Clock, PlanningAnalytics};
use callboard_storage::Database;

pub struct PlanningService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl PlanningService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn read_model(&self) -> Result<PlanningAnalytics> {
        let events = self.db.load_events_with_areas().await?;
        Ok(build_analytics(&events, self.clock.now()))
    }
}

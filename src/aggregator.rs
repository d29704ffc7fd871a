use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::cast::{aggregate_cast, work_with_cast};
use crate::filmography::aggregate_filmography;
use crate::gateway::{LookupError, LookupGateway};
use crate::models::{CastReport, Filmography, PersonId, Suggestion, WorkCast, WorkId};
use crate::suggest::search_suggestions;

/// Entry point for callers: a gateway plus the date treated as "today".
/// Holds no per-request state, so one instance can serve concurrent calls.
#[derive(Clone)]
pub struct Aggregator {
    gateway: Arc<dyn LookupGateway>,
    today: Option<NaiveDate>,
}

impl Aggregator {
    pub fn new(gateway: Arc<dyn LookupGateway>) -> Self {
        Self {
            gateway,
            today: None,
        }
    }

    /// Pins "today" instead of reading the local clock on every call.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn gateway(&self) -> &dyn LookupGateway {
        self.gateway.as_ref()
    }

    pub async fn cast(&self, work_id: WorkId, release_date: Option<NaiveDate>) -> CastReport {
        aggregate_cast(self.gateway(), work_id, release_date, self.today()).await
    }

    pub async fn work_with_cast(&self, work_id: WorkId) -> Result<WorkCast, LookupError> {
        work_with_cast(self.gateway(), work_id, self.today()).await
    }

    pub async fn filmography(&self, person_id: PersonId) -> Result<Filmography, LookupError> {
        aggregate_filmography(self.gateway(), person_id, self.today()).await
    }

    pub async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, LookupError> {
        search_suggestions(self.gateway(), query).await
    }
}

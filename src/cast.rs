use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use crate::enrich::{enrich_person, Enrichment};
use crate::gateway::{LookupError, LookupGateway};
use crate::models::{CastReport, EnrichedPerson, EnrichmentError, WorkCast, WorkId};

/// Fetches the credit list for a work and enriches every participant
/// concurrently, using the release date as the reference date.
///
/// The output has one entry per credited participant, in credit order. If
/// the credit list itself cannot be fetched the result has no people and a
/// single `Credits` error.
pub async fn aggregate_cast(
    gateway: &dyn LookupGateway,
    work_id: WorkId,
    release_date: Option<NaiveDate>,
    today: NaiveDate,
) -> CastReport {
    let credits = match gateway.get_people_for_work(work_id).await {
        Ok(credits) => credits,
        Err(source) => {
            warn!(work_id, "Failed to fetch credits: {}", source);
            return CastReport {
                people: Vec::new(),
                errors: vec![EnrichmentError::Credits { work_id, source }],
            };
        }
    };
    info!(work_id, participants = credits.len(), "Enriching cast");

    // Every lookup is in flight before any is awaited; completion order is
    // arbitrary so each result carries its credit index back.
    let mut in_flight: FuturesUnordered<_> = credits
        .into_iter()
        .enumerate()
        .map(move |(index, person)| async move {
            (index, enrich_person(gateway, person, release_date, today).await)
        })
        .collect();

    let mut slots: Vec<Option<Enrichment>> = vec![None; in_flight.len()];
    while let Some((index, enrichment)) = in_flight.next().await {
        slots[index] = Some(enrichment);
    }

    let mut people: Vec<EnrichedPerson> = Vec::with_capacity(slots.len());
    let mut errors = Vec::new();
    for enrichment in slots.into_iter().flatten() {
        people.push(enrichment.person);
        errors.extend(enrichment.error);
    }
    if !errors.is_empty() {
        warn!(
            work_id,
            failed = errors.len(),
            total = people.len(),
            "Cast enrichment completed with failures"
        );
    }
    CastReport { people, errors }
}

/// Looks up a work, then aggregates its cast against its release date.
pub async fn work_with_cast(
    gateway: &dyn LookupGateway,
    work_id: WorkId,
    today: NaiveDate,
) -> Result<WorkCast, LookupError> {
    let work = gateway
        .get_work(work_id)
        .await?
        .ok_or(LookupError::NotFound {
            kind: "work",
            id: work_id,
        })?;
    info!(work_id, "Matched work '{}'", work.title);
    let cast = aggregate_cast(gateway, work_id, work.release_date, today).await;
    Ok(WorkCast { work, cast })
}

use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::info;

use crate::age::{known_age, years_since_release};
use crate::enrich::with_biography;
use crate::gateway::{LookupError, LookupGateway};
use crate::models::{EnrichedWork, Filmography, PersonBiography, PersonId, WorkSummary};

/// Fetches a person's biography and credited works, then computes the
/// person's age at each release. Either fetch failing fails the call.
pub async fn aggregate_filmography(
    gateway: &dyn LookupGateway,
    person_id: PersonId,
    today: NaiveDate,
) -> Result<Filmography, LookupError> {
    let (bio, works) = tokio::try_join!(
        gateway.get_person(person_id),
        gateway.get_works_for_person(person_id),
    )?;
    info!(person_id, works = works.len(), "Building filmography for '{}'", bio.name);

    let person = with_biography(bio.summary(), &bio, None, today);
    let works = enrich_works(&bio, works, today);
    Ok(Filmography { person, works })
}

/// Local computation only: ages are derived from the one biography, then
/// works are ordered newest first with undated works last in upstream order.
pub fn enrich_works(
    bio: &PersonBiography,
    works: Vec<WorkSummary>,
    today: NaiveDate,
) -> Vec<EnrichedWork> {
    let mut enriched: Vec<EnrichedWork> = works
        .into_iter()
        .map(|work| {
            let release = work.release_date;
            EnrichedWork {
                age_at_release: known_age(bio.birth_date, release),
                years_since_release: years_since_release(release, today),
                released_after_death: matches!(
                    (release, bio.death_date),
                    (Some(r), Some(d)) if r > d
                ),
                work,
            }
        })
        .collect();
    // sort_by_key is stable
    enriched.sort_by_key(|w| (w.work.release_date.is_none(), Reverse(w.work.release_date)));
    enriched
}

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::age::known_age;
use crate::gateway::LookupGateway;
use crate::models::{EnrichedPerson, EnrichmentError, PersonBiography, PersonSummary};

/// Result of enriching one person. A failed biography lookup still yields a
/// person (with unknown dates and ages); the failure travels in `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub person: EnrichedPerson,
    pub error: Option<EnrichmentError>,
}

pub async fn enrich_person(
    gateway: &dyn LookupGateway,
    person: PersonSummary,
    reference: Option<NaiveDate>,
    today: NaiveDate,
) -> Enrichment {
    match gateway.get_person(person.id).await {
        Ok(bio) => {
            debug!(person_id = person.id, "biography fetched");
            Enrichment {
                person: with_biography(person, &bio, reference, today),
                error: None,
            }
        }
        Err(source) => {
            warn!(
                person_id = person.id,
                "Enrichment failed for '{}': {}", person.name, source
            );
            let error = EnrichmentError::Person {
                person_id: person.id,
                name: person.name.clone(),
                source,
            };
            Enrichment {
                person: EnrichedPerson::unknown(person),
                error: Some(error),
            }
        }
    }
}

/// Attaches biography dates and derived ages to a person. Pure.
pub fn with_biography(
    person: PersonSummary,
    bio: &PersonBiography,
    reference: Option<NaiveDate>,
    today: NaiveDate,
) -> EnrichedPerson {
    let birth = bio.birth_date;
    let death = bio.death_date;

    let age_at_reference = known_age(birth, reference);
    let current_age = match death {
        Some(_) => None,
        None => known_age(birth, Some(today)),
    };
    let age_at_death = death.and_then(|d| known_age(birth, Some(d)));
    let released_after_death = matches!((reference, death), (Some(r), Some(d)) if r > d);

    EnrichedPerson {
        id: person.id,
        name: if person.name.is_empty() {
            bio.name.clone()
        } else {
            person.name
        },
        role: person.role,
        profile_path: person.profile_path.or_else(|| bio.profile_path.clone()),
        birth_date: birth,
        death_date: death,
        age_at_reference,
        current_age,
        age_at_death,
        released_after_death,
    }
}

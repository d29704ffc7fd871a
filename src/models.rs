use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::LookupError;

pub type WorkId = i32;
pub type PersonId = i32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkSummary {
    pub id: WorkId,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PersonSummary {
    pub id: PersonId,
    pub name: String,
    /// Character name; only present in a cast listing.
    pub role: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PersonBiography {
    pub person_id: PersonId,
    pub name: String,
    pub profile_path: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

impl PersonBiography {
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.person_id,
            name: self.name.clone(),
            role: None,
            profile_path: self.profile_path.clone(),
        }
    }
}

/// A person with biography and derived ages attached.
///
/// When the birth date is known, exactly one of `current_age` and
/// `age_at_death` is set. Any derived age that would be negative is `None`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EnrichedPerson {
    pub id: PersonId,
    pub name: String,
    pub role: Option<String>,
    pub profile_path: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub age_at_reference: Option<i32>,
    pub current_age: Option<i32>,
    pub age_at_death: Option<i32>,
    pub released_after_death: bool,
}

impl EnrichedPerson {
    /// Slot used when the biography could not be fetched.
    pub fn unknown(person: PersonSummary) -> Self {
        Self {
            id: person.id,
            name: person.name,
            role: person.role,
            profile_path: person.profile_path,
            birth_date: None,
            death_date: None,
            age_at_reference: None,
            current_age: None,
            age_at_death: None,
            released_after_death: false,
        }
    }

    pub fn has_biography(&self) -> bool {
        self.birth_date.is_some() || self.death_date.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EnrichedWork {
    #[serde(flatten)]
    pub work: WorkSummary,
    pub age_at_release: Option<i32>,
    pub years_since_release: Option<i32>,
    pub released_after_death: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Suggestion {
    Work(WorkSummary),
    Person(PersonSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Work,
    Person,
}

impl Suggestion {
    pub fn kind(&self) -> SuggestionKind {
        match self {
            Suggestion::Work(_) => SuggestionKind::Work,
            Suggestion::Person(_) => SuggestionKind::Person,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Suggestion::Work(w) => w.id,
            Suggestion::Person(p) => p.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Suggestion::Work(w) => &w.title,
            Suggestion::Person(p) => &p.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum EnrichmentError {
    #[error("credits for work {work_id} unavailable: {source}")]
    Credits { work_id: WorkId, source: LookupError },
    #[error("biography for {name} ({person_id}) unavailable: {source}")]
    Person {
        person_id: PersonId,
        name: String,
        source: LookupError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastReport {
    pub people: Vec<EnrichedPerson>,
    pub errors: Vec<EnrichmentError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkCast {
    pub work: WorkSummary,
    pub cast: CastReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filmography {
    pub person: EnrichedPerson,
    pub works: Vec<EnrichedWork>,
}

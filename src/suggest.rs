use std::collections::HashSet;
use tracing::debug;

use crate::gateway::{LookupError, LookupGateway};
use crate::models::{PersonSummary, Suggestion, WorkSummary};

/// Queries shorter than this (after trimming) produce no suggestions.
pub const MIN_QUERY_CHARS: usize = 2;

/// Tags works and people, works first, and drops repeats of the same
/// (kind, id) keeping the first occurrence.
pub fn merge_suggestions(works: Vec<WorkSummary>, people: Vec<PersonSummary>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    works
        .into_iter()
        .map(Suggestion::Work)
        .chain(people.into_iter().map(Suggestion::Person))
        .filter(|s| seen.insert((s.kind(), s.id())))
        .collect()
}

/// Runs the work and person searches concurrently and merges the results.
pub async fn search_suggestions(
    gateway: &dyn LookupGateway,
    query: &str,
) -> Result<Vec<Suggestion>, LookupError> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(Vec::new());
    }
    let (works, people) = tokio::try_join!(
        gateway.search_works(query),
        gateway.search_people(query),
    )?;
    let merged = merge_suggestions(works, people);
    debug!(query = %query, suggestions = merged.len(), "Merged suggestions");
    Ok(merged)
}

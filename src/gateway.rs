use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{PersonBiography, PersonId, PersonSummary, WorkId, WorkSummary};

/// Failures a lookup can report. Messages are flattened to strings so a
/// failure can be stored in a result alongside successful entries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", content = "detail", rename_all = "snake_case")]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: i32 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request cancelled")]
    Cancelled,
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

/// Remote metadata provider. Implementations return records already converted
/// into the crate's typed entities; raw upstream shapes stay behind this trait.
#[async_trait]
pub trait LookupGateway: Send + Sync {
    async fn search_works(&self, query: &str) -> Result<Vec<WorkSummary>, LookupError>;
    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, LookupError>;
    async fn get_work(&self, id: WorkId) -> Result<Option<WorkSummary>, LookupError>;
    async fn get_people_for_work(&self, id: WorkId) -> Result<Vec<PersonSummary>, LookupError>;
    async fn get_person(&self, id: PersonId) -> Result<PersonBiography, LookupError>;
    async fn get_works_for_person(&self, id: PersonId) -> Result<Vec<WorkSummary>, LookupError>;
}

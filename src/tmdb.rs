use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::age::parse_date;
use crate::config::Config;
use crate::gateway::{LookupError, LookupGateway};
use crate::models::{PersonBiography, PersonId, PersonSummary, WorkId, WorkSummary};

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = format!("castage/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.http_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.clone(),
        })
    }

    /// Fetches and decodes a TMDB resource. A 404 comes back as `Ok(None)`.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        extra_query: &str,
    ) -> Result<Option<T>, LookupError> {
        let url = format!(
            "{}{path}?api_key={}&language=en-US{extra_query}",
            self.base_url, self.api_key
        );
        debug!(path = %path, "TMDB request");
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(path, "request failed", e))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| transport(path, "reading body failed", e))?;
        match status {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => return Err(LookupError::RateLimited),
            s if !s.is_success() => {
                return Err(LookupError::Transport(format!("{path} -> {s}: {text}")))
            }
            _ => {}
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| LookupError::Malformed(format!("{path}: {e}")))
    }

    async fn search<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<Vec<T>, LookupError> {
        let extra = format!("&query={}&include_adult=false", urlencoding::encode(query));
        let data: Option<Paged<T>> = self.get_json(path, &extra).await?;
        data.map(|p| p.results)
            .ok_or_else(|| LookupError::Transport(format!("{path} -> 404 Not Found")))
    }
}

#[async_trait]
impl LookupGateway for TmdbClient {
    async fn search_works(&self, query: &str) -> Result<Vec<WorkSummary>, LookupError> {
        let results: Vec<RawMovie> = self.search("/search/movie", query).await?;
        Ok(results.into_iter().map(RawMovie::into_summary).collect())
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, LookupError> {
        let results: Vec<RawCredit> = self.search("/search/person", query).await?;
        Ok(results.into_iter().map(RawCredit::into_summary).collect())
    }

    async fn get_work(&self, id: WorkId) -> Result<Option<WorkSummary>, LookupError> {
        let movie: Option<RawMovie> = self.get_json(&format!("/movie/{id}"), "").await?;
        Ok(movie.map(RawMovie::into_summary))
    }

    async fn get_people_for_work(&self, id: WorkId) -> Result<Vec<PersonSummary>, LookupError> {
        let credits: Credits<RawCredit> = self
            .get_json(&format!("/movie/{id}/credits"), "")
            .await?
            .ok_or(LookupError::NotFound { kind: "work", id })?;
        Ok(credits.cast.into_iter().map(RawCredit::into_summary).collect())
    }

    async fn get_person(&self, id: PersonId) -> Result<PersonBiography, LookupError> {
        let person: RawPerson = self
            .get_json(&format!("/person/{id}"), "")
            .await?
            .ok_or(LookupError::NotFound { kind: "person", id })?;
        Ok(person.into_biography())
    }

    async fn get_works_for_person(&self, id: PersonId) -> Result<Vec<WorkSummary>, LookupError> {
        let credits: Credits<RawMovie> = self
            .get_json(&format!("/person/{id}/movie_credits"), "")
            .await?
            .ok_or(LookupError::NotFound { kind: "person", id })?;
        Ok(credits.cast.into_iter().map(RawMovie::into_summary).collect())
    }
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Credits<T> {
    #[serde(default = "Vec::new")]
    cast: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    id: i32,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

impl RawMovie {
    fn into_summary(self) -> WorkSummary {
        WorkSummary {
            id: self.id,
            title: self.title.or(self.original_title).unwrap_or_default(),
            release_date: self.release_date.as_deref().and_then(parse_date),
            overview: self.overview.unwrap_or_default(),
            poster_path: non_empty(self.poster_path),
        }
    }
}

/// Shared shape of `/movie/{id}/credits` cast entries and `/search/person`
/// results.
#[derive(Debug, Deserialize)]
struct RawCredit {
    id: i32,
    name: Option<String>,
    character: Option<String>,
    profile_path: Option<String>,
}

impl RawCredit {
    fn into_summary(self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            name: self.name.unwrap_or_default(),
            role: non_empty(self.character),
            profile_path: non_empty(self.profile_path),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    id: i32,
    name: Option<String>,
    birthday: Option<String>,
    deathday: Option<String>,
    profile_path: Option<String>,
}

impl RawPerson {
    fn into_biography(self) -> PersonBiography {
        PersonBiography {
            person_id: self.id,
            name: self.name.unwrap_or_default(),
            profile_path: non_empty(self.profile_path),
            birth_date: self.birthday.as_deref().and_then(parse_date),
            death_date: self.deathday.as_deref().and_then(parse_date),
        }
    }
}

/// The request URL carries the API key, so it is stripped before the error
/// is flattened into a message.
fn transport(path: &str, what: &str, e: reqwest::Error) -> LookupError {
    LookupError::Transport(format!("{path}: {what}: {}", e.without_url()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Joins an image base (e.g. `https://image.tmdb.org/t/p/w185`) with a
/// poster or profile path.
pub fn image_url(base: &str, path: Option<&str>) -> Option<String> {
    let path = path?.trim();
    if path.is_empty() {
        return None;
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{base}{path}"))
    } else {
        Some(format!("{base}/{path}"))
    }
}

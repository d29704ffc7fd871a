//! Drive the enrichment pipeline from the command line.
//! Usage:
//!   castage [--json] search <query>
//!   castage [--json] movie <tmdb_movie_id>
//!   castage [--json] cast <tmdb_movie_id> [release_date]
//!   castage [--json] person <tmdb_person_id>
//!   castage age <birth_date> <target_date>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{bail, Context, Result};
use castage::age::{compute_age, display_age, parse_date};
use castage::cache::CachedGateway;
use castage::config::Config;
use castage::models::{CastReport, EnrichedPerson, Filmography, Suggestion};
use castage::tmdb::{image_url, TmdbClient};
use castage::{Aggregator, LookupError};
use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Search,
    Movie,
    Cast,
    Person,
    Age,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" => Ok(Command::Search),
            "movie" => Ok(Command::Movie),
            "cast" => Ok(Command::Cast),
            "person" => Ok(Command::Person),
            "age" => Ok(Command::Age),
            _ => Err(anyhow::anyhow!(
                "command must be one of: search, movie, cast, person, age"
            )),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_id(arg: Option<&String>, what: &str) -> Result<i32> {
    let raw = arg.with_context(|| format!("missing {what}"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("{what} must be a number, got '{raw}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_person_line(p: &EnrichedPerson, images: &str) {
    let role = p.role.as_deref().unwrap_or("-");
    println!(
        "{:>8}  {:<28} {:<24} at release: {:>3}  now: {:>3}  at death: {:>3}{}",
        p.id,
        p.name,
        role,
        display_age(p.age_at_reference),
        display_age(p.current_age),
        display_age(p.age_at_death),
        if p.released_after_death { "  (posthumous)" } else { "" }
    );
    if let Some(url) = image_url(images, p.profile_path.as_deref()) {
        debug!("profile image for {}: {}", p.id, url);
    }
}

fn print_cast(cast: &CastReport, images: &str) {
    for p in &cast.people {
        print_person_line(p, images);
    }
    for e in &cast.errors {
        eprintln!("warning: {e}");
    }
}

fn print_filmography(f: &Filmography, images: &str) {
    let p = &f.person;
    println!("{} ({})", p.name, p.id);
    println!(
        "  born: {}  died: {}  age: {}",
        p.birth_date.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string()),
        p.death_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        display_age(p.current_age.or(p.age_at_death)),
    );
    if let Some(url) = image_url(images, p.profile_path.as_deref()) {
        println!("  image: {url}");
    }
    for w in &f.works {
        println!(
            "{:>8}  {:<40} {:<10} age at release: {:>3}{}",
            w.work.id,
            w.work.title,
            w.work
                .release_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            display_age(w.age_at_release),
            if w.released_after_death { "  (posthumous)" } else { "" }
        );
    }
}

fn print_suggestions(list: &[Suggestion]) {
    for s in list {
        match s {
            Suggestion::Work(w) => println!(
                "work    {:>8}  {} ({})",
                w.id,
                w.title,
                w.release_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ),
            Suggestion::Person(p) => println!("person  {:>8}  {}", p.id, p.name),
        }
    }
}

/// A missing record is "no data" for the CLI, not a failure.
fn found<T>(result: Result<T, LookupError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            debug!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds the TMDB-backed aggregator; returns it with the image base URL.
fn build_aggregator() -> Result<(Aggregator, String)> {
    let config = Config::from_env()?;
    let tmdb = TmdbClient::new(&config)?;
    let gateway = CachedGateway::new(tmdb, config.cache_ttl, config.cache_max_entries);
    Ok((Aggregator::new(gateway.into_shared()), config.image_base_url))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let mut args: Vec<String> = env::args().skip(1).collect();
    let json = match args.iter().position(|a| a == "--json") {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    };
    let Some(first) = args.first() else {
        bail!("usage: castage [--json] <search|movie|cast|person|age> ...");
    };
    let command: Command = first.parse()?;

    match command {
        Command::Age => {
            let birth = args.get(1).context("missing birth date")?;
            let target = args.get(2).context("missing target date")?;
            let age = compute_age(Some(birth.as_str()), Some(target.as_str()));
            if json {
                print_json(&age)?;
            } else {
                println!("{}", display_age(age));
            }
        }
        Command::Search => {
            let (aggregator, _) = build_aggregator()?;
            let query = args[1..].join(" ");
            info!("Searching for '{}'", query);
            let results = aggregator.suggestions(&query).await?;
            if json {
                print_json(&results)?;
            } else {
                print_suggestions(&results);
            }
        }
        Command::Movie => {
            let (aggregator, images) = build_aggregator()?;
            let id = parse_id(args.get(1), "movie id")?;
            let Some(result) = found(aggregator.work_with_cast(id).await)? else {
                println!("No data for movie {id}");
                return Ok(());
            };
            if json {
                print_json(&result)?;
            } else {
                println!(
                    "{} ({})",
                    result.work.title,
                    result
                        .work
                        .release_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "N/A".to_string())
                );
                if let Some(url) = image_url(&images, result.work.poster_path.as_deref()) {
                    println!("  poster: {url}");
                }
                print_cast(&result.cast, &images);
            }
        }
        Command::Cast => {
            let (aggregator, images) = build_aggregator()?;
            let id = parse_id(args.get(1), "movie id")?;
            let release = match args.get(2) {
                Some(raw) => Some(
                    parse_date(raw).with_context(|| format!("invalid release date '{raw}'"))?,
                ),
                None => None,
            };
            let report = aggregator.cast(id, release).await;
            if json {
                print_json(&report)?;
            } else {
                print_cast(&report, &images);
            }
        }
        Command::Person => {
            let (aggregator, images) = build_aggregator()?;
            let id = parse_id(args.get(1), "person id")?;
            let Some(filmography) = found(aggregator.filmography(id).await)? else {
                println!("No data for person {id}");
                return Ok(());
            };
            if json {
                print_json(&filmography)?;
            } else {
                print_filmography(&filmography, &images);
            }
        }
    }
    Ok(())
}

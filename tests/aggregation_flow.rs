use castage::cache::CachedGateway;
use castage::generation::Generations;
use castage::models::{
    EnrichmentError, PersonBiography, PersonSummary, Suggestion, SuggestionKind, WorkSummary,
};
use castage::{Aggregator, LookupError, LookupGateway};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid test date")
}

#[derive(Default)]
struct FakeGateway {
    works: HashMap<i32, WorkSummary>,
    credits: HashMap<i32, Vec<PersonSummary>>,
    people: HashMap<i32, PersonBiography>,
    filmographies: HashMap<i32, Vec<WorkSummary>>,
    search_works: Vec<WorkSummary>,
    search_people: Vec<PersonSummary>,
    /// Person lookups that fail with a transport error.
    failing_people: HashSet<i32>,
    /// Artificial latency per person lookup.
    person_delay: HashMap<i32, Duration>,
    search_delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait::async_trait]
impl LookupGateway for FakeGateway {
    async fn search_works(&self, query: &str) -> Result<Vec<WorkSummary>, LookupError> {
        self.record(format!("search_works:{query}"));
        tokio::time::sleep(self.search_delay).await;
        Ok(self.search_works.clone())
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, LookupError> {
        self.record(format!("search_people:{query}"));
        tokio::time::sleep(self.search_delay).await;
        Ok(self.search_people.clone())
    }

    async fn get_work(&self, id: i32) -> Result<Option<WorkSummary>, LookupError> {
        self.record(format!("get_work:{id}"));
        Ok(self.works.get(&id).cloned())
    }

    async fn get_people_for_work(&self, id: i32) -> Result<Vec<PersonSummary>, LookupError> {
        self.record(format!("get_people_for_work:{id}"));
        self.credits
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::Transport(format!("credits {id} unavailable")))
    }

    async fn get_person(&self, id: i32) -> Result<PersonBiography, LookupError> {
        self.record(format!("get_person:{id}"));
        if let Some(delay) = self.person_delay.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        self.record(format!("done_person:{id}"));
        if self.failing_people.contains(&id) {
            return Err(LookupError::Transport(format!("person {id} timed out")));
        }
        self.people
            .get(&id)
            .cloned()
            .ok_or(LookupError::NotFound { kind: "person", id })
    }

    async fn get_works_for_person(&self, id: i32) -> Result<Vec<WorkSummary>, LookupError> {
        self.record(format!("get_works_for_person:{id}"));
        self.filmographies
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::Transport(format!("filmography {id} unavailable")))
    }
}

fn work(id: i32, title: &str, release: Option<NaiveDate>) -> WorkSummary {
    WorkSummary {
        id,
        title: title.to_string(),
        release_date: release,
        overview: format!("{title} overview"),
        poster_path: Some(format!("/{id}.jpg")),
    }
}

fn credit(id: i32, name: &str, role: &str) -> PersonSummary {
    PersonSummary {
        id,
        name: name.to_string(),
        role: Some(role.to_string()),
        profile_path: None,
    }
}

fn bio(id: i32, name: &str, birth: Option<NaiveDate>, death: Option<NaiveDate>) -> PersonBiography {
    PersonBiography {
        person_id: id,
        name: name.to_string(),
        profile_path: Some(format!("/p{id}.jpg")),
        birth_date: birth,
        death_date: death,
    }
}

/// Five credited people; earlier credits resolve slowest.
fn cast_gateway() -> FakeGateway {
    let mut g = FakeGateway::default();
    g.works.insert(100, work(100, "The Film", Some(d(2008, 7, 18))));
    g.credits.insert(
        100,
        vec![
            credit(1, "Lead", "Hero"),
            credit(2, "Villain", "Joker"),
            credit(3, "Support", "Butler"),
            credit(4, "Cameo", "Guard"),
            credit(5, "Newcomer", "Kid"),
        ],
    );
    g.people.insert(1, bio(1, "Lead", Some(d(1974, 1, 30)), None));
    g.people
        .insert(2, bio(2, "Villain", Some(d(1979, 4, 4)), Some(d(2008, 1, 22))));
    g.people.insert(3, bio(3, "Support", Some(d(1933, 3, 14)), None));
    g.people.insert(4, bio(4, "Cameo", None, None));
    g.people.insert(5, bio(5, "Newcomer", Some(d(2010, 1, 1)), None));
    for (id, ms) in [(1, 50), (2, 40), (3, 30), (4, 20), (5, 10)] {
        g.person_delay.insert(id, Duration::from_millis(ms));
    }
    g
}

fn aggregator(g: Arc<FakeGateway>) -> Aggregator {
    Aggregator::new(g).with_today(d(2024, 6, 1))
}

#[tokio::test(start_paused = true)]
async fn cast_keeps_credit_order_when_lookups_finish_out_of_order() {
    let g = Arc::new(cast_gateway());
    let report = aggregator(g.clone()).cast(100, Some(d(2008, 7, 18))).await;

    let ids: Vec<i32> = report.people.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(report.errors.is_empty());
    assert_eq!(report.people[0].role.as_deref(), Some("Hero"));

    // Lookups completed in reverse credit order.
    let completed: Vec<String> = g
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("done_person"))
        .collect();
    assert_eq!(
        completed,
        vec![
            "done_person:5",
            "done_person:4",
            "done_person:3",
            "done_person:2",
            "done_person:1"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cast_lookups_run_concurrently() {
    let g = Arc::new(cast_gateway());
    let started = tokio::time::Instant::now();
    let report = aggregator(g).cast(100, Some(d(2008, 7, 18))).await;
    let elapsed = started.elapsed();

    assert_eq!(report.people.len(), 5);
    // Slowest single lookup is 50ms; serial would be 150ms.
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(100), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn cast_derives_ages_per_person() {
    let g = Arc::new(cast_gateway());
    let report = aggregator(g).cast(100, Some(d(2008, 7, 18))).await;
    let by_id = |id: i32| {
        report
            .people
            .iter()
            .find(|p| p.id == id)
            .expect("person present")
    };

    let lead = by_id(1);
    assert_eq!(lead.age_at_reference, Some(34));
    assert_eq!(lead.current_age, Some(50));
    assert_eq!(lead.age_at_death, None);

    let villain = by_id(2);
    assert_eq!(villain.age_at_reference, Some(29));
    assert_eq!(villain.current_age, None);
    assert_eq!(villain.age_at_death, Some(28));
    assert!(villain.released_after_death);

    let cameo = by_id(4);
    assert_eq!(cameo.age_at_reference, None);
    assert_eq!(cameo.current_age, None);

    // Born after release: no negative age is reported.
    let newcomer = by_id(5);
    assert_eq!(newcomer.age_at_reference, None);
    assert_eq!(newcomer.current_age, Some(14));
}

#[tokio::test(start_paused = true)]
async fn one_failed_lookup_does_not_sink_the_cast() {
    let mut g = cast_gateway();
    g.failing_people.insert(3);
    let report = aggregator(Arc::new(g)).cast(100, Some(d(2008, 7, 18))).await;

    assert_eq!(report.people.len(), 5);
    let failed = &report.people[2];
    assert_eq!(failed.id, 3);
    assert_eq!(failed.name, "Support");
    assert_eq!(failed.role.as_deref(), Some("Butler"));
    assert!(!failed.has_biography());
    assert_eq!(failed.age_at_reference, None);
    assert_eq!(failed.current_age, None);
    assert_eq!(failed.age_at_death, None);

    let with_reference_age = report
        .people
        .iter()
        .filter(|p| p.age_at_reference.is_some())
        .count();
    assert_eq!(with_reference_age, 2);

    assert_eq!(report.errors.len(), 1);
    match &report.errors[0] {
        EnrichmentError::Person {
            person_id, source, ..
        } => {
            assert_eq!(*person_id, 3);
            assert!(matches!(source, LookupError::Transport(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn failed_credit_list_yields_single_top_level_error() {
    let g = Arc::new(cast_gateway());
    let report = aggregator(g.clone()).cast(999, None).await;

    assert!(report.people.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0],
        EnrichmentError::Credits { work_id: 999, .. }
    ));
    assert_eq!(g.count("get_person"), 0);
}

#[tokio::test]
async fn empty_credit_list_is_not_an_error() {
    let mut g = cast_gateway();
    g.credits.insert(200, Vec::new());
    let report = aggregator(Arc::new(g)).cast(200, None).await;
    assert!(report.people.is_empty());
    assert!(report.errors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn work_with_cast_uses_the_work_release_date() {
    let g = Arc::new(cast_gateway());
    let result = aggregator(g.clone())
        .work_with_cast(100)
        .await
        .expect("work exists");
    assert_eq!(result.work.title, "The Film");
    assert_eq!(result.cast.people[0].age_at_reference, Some(34));

    let missing = aggregator(g).work_with_cast(404).await;
    assert_eq!(
        missing.unwrap_err(),
        LookupError::NotFound {
            kind: "work",
            id: 404
        }
    );
}

fn filmography_gateway() -> FakeGateway {
    let mut g = FakeGateway::default();
    g.people
        .insert(7, bio(7, "Subject", Some(d(1956, 7, 9)), None));
    g.filmographies.insert(
        7,
        vec![
            work(10, "Old", Some(d(1988, 12, 21))),
            work(11, "Unreleased A", None),
            work(12, "Recent", Some(d(2019, 11, 22))),
            work(13, "Unreleased B", None),
            work(14, "Middle", Some(d(1994, 7, 6))),
        ],
    );
    g
}

#[tokio::test]
async fn filmography_sorts_newest_first_and_computes_ages() {
    let g = Arc::new(filmography_gateway());
    let f = aggregator(g.clone())
        .filmography(7)
        .await
        .expect("filmography");

    let ids: Vec<i32> = f.works.iter().map(|w| w.work.id).collect();
    assert_eq!(ids, vec![12, 14, 10, 11, 13]);
    assert_eq!(f.works[0].age_at_release, Some(63));
    assert_eq!(f.works[1].age_at_release, Some(37));
    assert_eq!(f.works[2].age_at_release, Some(32));
    assert_eq!(f.works[3].age_at_release, None);

    assert_eq!(f.person.name, "Subject");
    assert_eq!(f.person.current_age, Some(67));
    assert_eq!(f.person.age_at_reference, None);

    // Ages come from the single biography fetch.
    assert_eq!(g.count("get_person"), 1);
    assert_eq!(g.count("get_works_for_person"), 1);
}

#[tokio::test]
async fn filmography_is_deterministic() {
    let g = Arc::new(filmography_gateway());
    let agg = aggregator(g);
    let first = agg.filmography(7).await.expect("first");
    let second = agg.filmography(7).await.expect("second");
    let a = serde_json::to_vec(&first.works).expect("serialize");
    let b = serde_json::to_vec(&second.works).expect("serialize");
    assert_eq!(a, b);
}

#[tokio::test]
async fn filmography_fails_when_either_fetch_fails() {
    let mut g = filmography_gateway();
    // Biography resolves, works fail.
    g.people.insert(8, bio(8, "No credits", None, None));
    // Works resolve, biography fails.
    g.filmographies.insert(77, vec![work(70, "Known Work", Some(d(2001, 5, 4)))]);
    g.failing_people.insert(77);
    // Works resolve, biography missing.
    g.filmographies.insert(99, Vec::new());
    let agg = aggregator(Arc::new(g));

    assert_eq!(
        agg.filmography(8).await.expect_err("works fetch fails"),
        LookupError::Transport("filmography 8 unavailable".to_string())
    );
    assert_eq!(
        agg.filmography(77).await.expect_err("biography fetch fails"),
        LookupError::Transport("person 77 timed out".to_string())
    );
    assert_eq!(
        agg.filmography(99).await.expect_err("biography missing"),
        LookupError::NotFound { kind: "person", id: 99 }
    );
}

fn search_gateway() -> FakeGateway {
    let mut g = FakeGateway::default();
    g.search_works = vec![
        work(1, "Heat", Some(d(1995, 12, 15))),
        work(1, "Heat (duplicate)", Some(d(1995, 12, 15))),
        work(2, "Heat Wave", None),
    ];
    g.search_people = vec![
        PersonSummary {
            id: 1,
            name: "Heath".to_string(),
            role: None,
            profile_path: None,
        },
    ];
    g.search_delay = Duration::from_millis(30);
    g
}

#[tokio::test(start_paused = true)]
async fn suggestions_merge_both_searches_concurrently() {
    let g = Arc::new(search_gateway());
    let started = tokio::time::Instant::now();
    let list = aggregator(g.clone())
        .suggestions("  heat ")
        .await
        .expect("suggestions");
    assert!(started.elapsed() < Duration::from_millis(60));

    let keys: Vec<(SuggestionKind, i32)> = list.iter().map(|s| (s.kind(), s.id())).collect();
    assert_eq!(
        keys,
        vec![
            (SuggestionKind::Work, 1),
            (SuggestionKind::Work, 2),
            (SuggestionKind::Person, 1)
        ]
    );
    assert!(matches!(&list[0], Suggestion::Work(w) if w.title == "Heat"));
    assert!(g.calls().contains(&"search_works:heat".to_string()));
}

#[tokio::test]
async fn short_queries_skip_the_gateway() {
    let g = Arc::new(search_gateway());
    let list = aggregator(g.clone()).suggestions(" h ").await.expect("empty");
    assert!(list.is_empty());
    assert!(g.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_search_results_are_discarded_by_the_caller() {
    let g = Arc::new(search_gateway());
    let agg = aggregator(g);
    let generations = Generations::new();

    let first = generations.next();
    let first_run = first.run(agg.suggestions("hea"));
    let second_run = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = generations.next();
        second.run(agg.suggestions("heat")).await
    };
    let (first_result, second_result) = tokio::join!(first_run, second_run);

    assert_eq!(first_result, Err(LookupError::Cancelled));
    let stamped = second_result.expect("latest request completes");
    let accepted = generations.accept(stamped).expect("current generation");
    assert_eq!(accepted.expect("search ok").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cached_gateway_serves_repeat_lookups_locally() {
    let fake = cast_gateway();
    let cached = CachedGateway::new(fake, Duration::from_secs(60), 100);
    let shared = Arc::new(cached);
    let agg = Aggregator::new(shared.clone()).with_today(d(2024, 6, 1));

    let first = agg.cast(100, Some(d(2008, 7, 18))).await;
    let second = agg.cast(100, Some(d(2008, 7, 18))).await;
    assert_eq!(first, second);
    assert_eq!(shared.inner().count("get_people_for_work"), 1);
    assert_eq!(shared.inner().count("get_person"), 5);

    tokio::time::advance(Duration::from_secs(61)).await;
    let _ = agg.cast(100, Some(d(2008, 7, 18))).await;
    assert_eq!(shared.inner().count("get_people_for_work"), 2);
}

#[tokio::test(start_paused = true)]
async fn cached_gateway_does_not_remember_failures() {
    let mut fake = cast_gateway();
    fake.failing_people.insert(2);
    let shared = Arc::new(CachedGateway::new(fake, Duration::from_secs(60), 100));
    let agg = Aggregator::new(shared.clone()).with_today(d(2024, 6, 1));

    let _ = agg.cast(100, None).await;
    let again = agg.cast(100, None).await;
    assert_eq!(again.errors.len(), 1);
    let person_two_calls = shared
        .inner()
        .calls()
        .iter()
        .filter(|c| c.as_str() == "get_person:2")
        .count();
    assert_eq!(person_two_calls, 2);
}

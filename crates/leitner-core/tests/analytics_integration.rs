//! Integration tests for the analytics engine.
//!
//! Reviews are produced through the scheduler with a pinned clock, then the
//! aggregates are read back through `Analytics` sharing the same store.

use std::sync::Arc;

use chrono::{Days, NaiveDate, TimeZone, Utc};
use leitner_core::{
    Analytics, BoxDistribution, Category, FixedClock, Item, MemoryStore, RecordStore, Scheduler,
    SqliteStore,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

struct Fixture<S: RecordStore> {
    scheduler: Scheduler<Arc<S>, FixedClock>,
    analytics: Analytics<Arc<S>, FixedClock>,
    clock: FixedClock,
}

fn fixture<S: RecordStore>(store: S) -> Fixture<S> {
    let store = Arc::new(store);
    for (id, name) in [("verbs", "Verbs"), ("nouns", "Nouns"), ("empty", "Empty")] {
        store
            .register_category(&Category {
                id: id.to_string(),
                name: name.to_string(),
            })
            .unwrap();
    }
    let clock = FixedClock::on_date(today());
    Fixture {
        scheduler: Scheduler::with_clock(Arc::clone(&store), clock.clone()),
        analytics: Analytics::with_clock(store, clock.clone()),
        clock,
    }
}

fn add_item<S: RecordStore>(fx: &Fixture<S>, id: &str, category: &str) {
    fx.scheduler
        .register_item(Item {
            id: id.to_string(),
            subject_id: "ana".to_string(),
            category_id: category.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
        .unwrap();
}

fn overview_without_reviews<S: RecordStore>(store: S) {
    let fx = fixture(store);
    add_item(&fx, "v1", "verbs");
    add_item(&fx, "v2", "verbs");

    let overview = fx.analytics.overview("ana").unwrap();
    assert_eq!(overview.total_items, 2);
    assert_eq!(overview.total_reviews, 0);
    assert_eq!(overview.reviews_today, 0);
    assert_eq!(overview.items_due, 2);
    assert_eq!(overview.overall_accuracy, 0.0);
    assert_eq!(overview.mastered_count, 0);
    assert_eq!(overview.box_distribution.count(1), 2);
    for b in 2..=5 {
        assert_eq!(overview.box_distribution.count(b), 0);
    }

    let nobody = fx.analytics.overview("nobody").unwrap();
    assert_eq!(nobody.box_distribution, BoxDistribution::default());
    assert_eq!(nobody.overall_accuracy, 0.0);
}

#[test]
fn test_overview_empty_sqlite() {
    overview_without_reviews(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn test_overview_empty_memory() {
    overview_without_reviews(MemoryStore::new());
}

fn overview_after_reviews<S: RecordStore>(store: S) {
    let fx = fixture(store);
    add_item(&fx, "v1", "verbs");
    add_item(&fx, "n1", "nouns");

    for _ in 0..4 {
        fx.scheduler.process_review("v1", "ana", true, None).unwrap();
    }
    fx.scheduler.process_review("n1", "ana", false, None).unwrap();
    fx.clock.advance_days(1);
    fx.scheduler.process_review("n1", "ana", true, None).unwrap();

    let overview = fx.analytics.overview("ana").unwrap();
    assert_eq!(overview.total_reviews, 6);
    assert_eq!(overview.reviews_today, 1);
    assert_eq!(overview.overall_accuracy, 83.33);
    assert_eq!(overview.mastered_count, 1);
    assert_eq!(overview.box_distribution.count(5), 1);
    assert_eq!(overview.box_distribution.count(2), 1);
    assert_eq!(overview.items_due, 0);
}

#[test]
fn test_overview_sqlite() {
    overview_after_reviews(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn test_overview_memory() {
    overview_after_reviews(MemoryStore::new());
}

fn history_is_dense<S: RecordStore>(store: S) {
    let fx = fixture(store);
    add_item(&fx, "v1", "verbs");

    let quiet = fx.analytics.review_history("ana", 7).unwrap();
    assert_eq!(quiet.dates.len(), 7);
    assert_eq!(quiet.dates.last().copied(), Some(today()));
    assert!(quiet.dates.windows(2).all(|w| w[0].succ_opt() == Some(w[1])));
    assert!(quiet.totals.iter().all(|t| *t == 0));

    fx.scheduler.process_review("v1", "ana", true, None).unwrap();
    fx.scheduler.process_review("v1", "ana", false, None).unwrap();
    fx.clock.advance_days(2);
    fx.scheduler.process_review("v1", "ana", true, None).unwrap();

    let history = fx.analytics.review_history("ana", 7).unwrap();
    assert_eq!(history.dates.len(), 7);
    assert_eq!(history.dates[6], today().checked_add_days(Days::new(2)).unwrap());
    assert_eq!(history.totals, vec![0, 0, 0, 0, 2, 0, 1]);
    assert_eq!(history.corrects, vec![0, 0, 0, 0, 1, 0, 1]);
    assert_eq!(history.incorrects, vec![0, 0, 0, 0, 1, 0, 0]);
}

#[test]
fn test_history_sqlite() {
    history_is_dense(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn test_history_memory() {
    history_is_dense(MemoryStore::new());
}

fn category_rows<S: RecordStore>(store: S) {
    let fx = fixture(store);
    add_item(&fx, "v1", "verbs");
    add_item(&fx, "v2", "verbs");
    add_item(&fx, "n1", "nouns");

    fx.scheduler.process_review("v1", "ana", true, None).unwrap();
    fx.scheduler.process_review("v2", "ana", false, None).unwrap();
    fx.scheduler.process_review("v2", "ana", false, None).unwrap();

    let rows = fx.analytics.category_statistics("ana").unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.category_name.as_str()).collect();
    assert_eq!(names, vec!["Nouns", "Verbs"]);

    let verbs = &rows[1];
    assert_eq!(verbs.total_items, 2);
    assert_eq!(verbs.total_reviews, 3);
    assert_eq!(verbs.accuracy, 33.33);
    assert_eq!(verbs.mastered, 0);
    assert_eq!(verbs.mastered_percent, 0.0);

    let nouns = &rows[0];
    assert_eq!(nouns.total_reviews, 0);
    assert_eq!(nouns.accuracy, 0.0);

    let progress = fx.analytics.category_progress("verbs", "ana").unwrap();
    assert_eq!(progress.total_items, 2);
    assert_eq!(progress.due_today, 0);
    assert_eq!(progress.box_distribution.count(2), 1);
    assert_eq!(progress.box_distribution.count(1), 1);
}

#[test]
fn test_category_rows_sqlite() {
    category_rows(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn test_category_rows_memory() {
    category_rows(MemoryStore::new());
}

fn streak_from_review_days<S: RecordStore>(store: S) {
    let fx = fixture(store);
    add_item(&fx, "v1", "verbs");

    let empty = fx.analytics.learning_streak("ana").unwrap();
    assert_eq!((empty.current_streak, empty.longest_streak), (0, 0));

    // Six consecutive review days, then a four day pause.
    for _ in 0..6 {
        fx.scheduler.process_review("v1", "ana", true, None).unwrap();
        fx.clock.advance_days(1);
    }
    fx.clock.advance_days(4);
    let stale = fx.analytics.learning_streak("ana").unwrap();
    assert_eq!(stale.current_streak, 0);
    assert_eq!(stale.longest_streak, 6);

    fx.scheduler.process_review("v1", "ana", true, None).unwrap();
    fx.clock.advance_days(1);
    fx.scheduler.process_review("v1", "ana", false, None).unwrap();
    let fresh = fx.analytics.learning_streak("ana").unwrap();
    assert_eq!(fresh.current_streak, 2);
    assert_eq!(fresh.longest_streak, 6);

    fx.clock.advance_days(1);
    let yesterday = fx.analytics.learning_streak("ana").unwrap();
    assert_eq!(yesterday.current_streak, 2);
}

#[test]
fn test_streak_sqlite() {
    streak_from_review_days(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn test_streak_memory() {
    streak_from_review_days(MemoryStore::new());
}

//! Record store contract and its implementations.
//!
//! The engines never own persistence. They talk to a [`RecordStore`], which
//! keeps one [`ScheduleRecord`] per item plus the append-only review log.
//!
//! - [`SqliteStore`]: SQLite file (or in-memory) database with versioned migrations
//! - [`MemoryStore`]: mutex-guarded maps for embedding and tests

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{Category, Item, ReviewLogEntry, ScheduleRecord, ScheduledItem};

/// Selection over schedule records. Unset fields do not narrow; set fields are AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Keep records whose `next_review_date` is on or before this date.
    pub due_on_or_before: Option<NaiveDate>,
    /// Owning subject of the item.
    pub subject_id: Option<String>,
    pub category_id: Option<String>,
    pub box_number: Option<u8>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn due_by(mut self, date: NaiveDate) -> Self {
        self.due_on_or_before = Some(date);
        self
    }

    pub fn for_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn in_box(mut self, box_number: u8) -> Self {
        self.box_number = Some(box_number);
        self
    }

    pub fn matches(&self, scheduled: &ScheduledItem) -> bool {
        self.due_on_or_before
            .map_or(true, |date| scheduled.record.next_review_date <= date)
            && self
                .subject_id
                .as_deref()
                .map_or(true, |s| scheduled.item.subject_id == s)
            && self
                .category_id
                .as_deref()
                .map_or(true, |c| scheduled.item.category_id == c)
            && self
                .box_number
                .map_or(true, |b| scheduled.record.box_number == b)
    }
}

/// Selection over the review log. Date bounds are inclusive UTC calendar dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewLogFilter {
    pub subject_id: Option<String>,
    pub item_id: Option<String>,
    /// Category of the reviewed item.
    pub category_id: Option<String>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl ReviewLogFilter {
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            ..Self::default()
        }
    }

    pub fn for_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    /// Date bounds and subject/item only; category needs the item registry.
    fn matches_entry(&self, entry: &ReviewLogEntry) -> bool {
        let day = entry.occurred_at.date_naive();
        self.subject_id
            .as_deref()
            .map_or(true, |s| entry.subject_id == s)
            && self.item_id.as_deref().map_or(true, |i| entry.item_id == i)
            && self.since.map_or(true, |since| day >= since)
            && self.until.map_or(true, |until| day <= until)
    }
}

/// Result of a read-modify-write step: the record to write back and, for a
/// review, the log entry that must land in the same atomic unit.
#[derive(Debug, Clone)]
pub struct RecordChange {
    pub record: ScheduleRecord,
    pub log_entry: Option<ReviewLogEntry>,
}

/// Persistence contract consumed by the engines.
///
/// Implementations must make [`modify_schedule_record`](Self::modify_schedule_record)
/// atomic and serialized per item: two concurrent reviews of the same item
/// must not both read the same prior box.
pub trait RecordStore {
    /// Add a category. Duplicate ids are rejected.
    fn register_category(&self, category: &Category) -> Result<()>;

    /// All categories, ordered by name.
    fn list_categories(&self) -> Result<Vec<Category>>;

    /// Add an item and its initial schedule record in one unit.
    ///
    /// Fails when the item id is taken or the category is unknown.
    fn register_item(&self, item: &Item, initial: &ScheduleRecord) -> Result<()>;

    fn get_item(&self, item_id: &str) -> Result<Option<Item>>;

    fn get_schedule_record(&self, item_id: &str) -> Result<Option<ScheduleRecord>>;

    /// Insert or replace the record of an already registered item.
    fn upsert_schedule_record(&self, record: &ScheduleRecord) -> Result<()>;

    /// Append one entry to the review log of an already registered item.
    fn append_review_log(&self, entry: &ReviewLogEntry) -> Result<()>;

    /// Atomically read the record for `item_id`, hand it to `modify`, and
    /// persist the returned record together with its optional log entry.
    ///
    /// Returns `Ok(None)` without calling `modify` when no record exists.
    /// If `modify` fails nothing is written.
    fn modify_schedule_record(
        &self,
        item_id: &str,
        modify: &mut dyn FnMut(&ScheduleRecord) -> Result<RecordChange>,
    ) -> Result<Option<ScheduleRecord>>;

    /// Records joined with their items, ordered by item creation time then id.
    fn query_schedule_records(&self, filter: &RecordFilter) -> Result<Vec<ScheduledItem>>;

    /// Review log entries ordered by `occurred_at`.
    fn query_review_log(&self, filter: &ReviewLogFilter) -> Result<Vec<ReviewLogEntry>>;

    /// Distinct UTC dates with at least one review by the subject, newest first.
    fn list_distinct_review_dates(&self, subject_id: &str) -> Result<Vec<NaiveDate>>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn register_category(&self, category: &Category) -> Result<()> {
        (**self).register_category(category)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        (**self).list_categories()
    }

    fn register_item(&self, item: &Item, initial: &ScheduleRecord) -> Result<()> {
        (**self).register_item(item, initial)
    }

    fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        (**self).get_item(item_id)
    }

    fn get_schedule_record(&self, item_id: &str) -> Result<Option<ScheduleRecord>> {
        (**self).get_schedule_record(item_id)
    }

    fn upsert_schedule_record(&self, record: &ScheduleRecord) -> Result<()> {
        (**self).upsert_schedule_record(record)
    }

    fn append_review_log(&self, entry: &ReviewLogEntry) -> Result<()> {
        (**self).append_review_log(entry)
    }

    fn modify_schedule_record(
        &self,
        item_id: &str,
        modify: &mut dyn FnMut(&ScheduleRecord) -> Result<RecordChange>,
    ) -> Result<Option<ScheduleRecord>> {
        (**self).modify_schedule_record(item_id, modify)
    }

    fn query_schedule_records(&self, filter: &RecordFilter) -> Result<Vec<ScheduledItem>> {
        (**self).query_schedule_records(filter)
    }

    fn query_review_log(&self, filter: &ReviewLogFilter) -> Result<Vec<ReviewLogEntry>> {
        (**self).query_review_log(filter)
    }

    fn list_distinct_review_dates(&self, subject_id: &str) -> Result<Vec<NaiveDate>> {
        (**self).list_distinct_review_dates(subject_id)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn register_category(&self, category: &Category) -> Result<()> {
        (**self).register_category(category)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        (**self).list_categories()
    }

    fn register_item(&self, item: &Item, initial: &ScheduleRecord) -> Result<()> {
        (**self).register_item(item, initial)
    }

    fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        (**self).get_item(item_id)
    }

    fn get_schedule_record(&self, item_id: &str) -> Result<Option<ScheduleRecord>> {
        (**self).get_schedule_record(item_id)
    }

    fn upsert_schedule_record(&self, record: &ScheduleRecord) -> Result<()> {
        (**self).upsert_schedule_record(record)
    }

    fn append_review_log(&self, entry: &ReviewLogEntry) -> Result<()> {
        (**self).append_review_log(entry)
    }

    fn modify_schedule_record(
        &self,
        item_id: &str,
        modify: &mut dyn FnMut(&ScheduleRecord) -> Result<RecordChange>,
    ) -> Result<Option<ScheduleRecord>> {
        (**self).modify_schedule_record(item_id, modify)
    }

    fn query_schedule_records(&self, filter: &RecordFilter) -> Result<Vec<ScheduledItem>> {
        (**self).query_schedule_records(filter)
    }

    fn query_review_log(&self, filter: &ReviewLogFilter) -> Result<Vec<ReviewLogEntry>> {
        (**self).query_review_log(filter)
    }

    fn list_distinct_review_dates(&self, subject_id: &str) -> Result<Vec<NaiveDate>> {
        (**self).list_distinct_review_dates(subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn scheduled(subject: &str, category: &str, box_number: u8, due: NaiveDate) -> ScheduledItem {
        ScheduledItem {
            item: Item {
                id: "card".to_string(),
                subject_id: subject.to_string(),
                category_id: category.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
            record: ScheduleRecord {
                box_number,
                next_review_date: due,
                ..ScheduleRecord::new("card", due)
            },
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(RecordFilter::all().matches(&scheduled("ana", "verbs", 3, due)));
    }

    #[test]
    fn filter_fields_are_and_combined() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let item = scheduled("ana", "verbs", 2, today);

        let filter = RecordFilter::all()
            .due_by(today)
            .for_subject("ana")
            .in_category("verbs");
        assert!(filter.matches(&item));
        assert!(!filter.clone().for_subject("ben").matches(&item));
        assert!(!filter.clone().in_category("nouns").matches(&item));
        assert!(!filter.clone().in_box(4).matches(&item));

        let tomorrow = today.succ_opt().unwrap();
        assert!(!RecordFilter::all()
            .due_by(today)
            .matches(&scheduled("ana", "verbs", 2, tomorrow)));
    }

    #[test]
    fn log_filter_bounds_are_inclusive() {
        let entry = ReviewLogEntry {
            item_id: "card".to_string(),
            subject_id: "ana".to_string(),
            occurred_at: Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 0).unwrap(),
            was_correct: true,
            time_spent_seconds: None,
        };
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let filter = ReviewLogFilter::for_subject("ana").since(day).until(day);
        assert!(filter.matches_entry(&entry));
        assert!(!ReviewLogFilter::for_subject("ana")
            .since(day.succ_opt().unwrap())
            .matches_entry(&entry));
        assert!(!ReviewLogFilter::for_subject("ben").matches_entry(&entry));
    }
}

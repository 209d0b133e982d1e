//! Leitner box scheduling engine.
//!
//! This module applies the box-transition rule to review outcomes and
//! selects the items due for review:
//! - A correct answer moves the item up one box, saturating at box 5
//! - An incorrect answer sends the item back to box 1 from any box
//! - The next review date is the new box's interval counted from today
//! - Due items are filtered by subject/category, ordered, then truncated
//!
//! Every state change goes through [`RecordStore::modify_schedule_record`], so
//! the record update and its review log entry land together or not at all.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result, ValidationError};
use crate::intervals::{self, MAX_BOX, MIN_BOX};
use crate::model::{Item, ReviewLogEntry, ReviewOrder, ScheduleRecord, ScheduledItem};
use crate::settings::ReviewSettings;
use crate::stats::percentage;
use crate::storage::{RecordChange, RecordFilter, RecordStore};

/// Optional narrowing of the due set. Both fields AND-combine when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueFilter {
    pub category_id: Option<String>,
    pub subject_id: Option<String>,
}

impl DueFilter {
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

/// Result of processing one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub item_id: String,
    pub previous_box: u8,
    pub new_box: u8,
    pub next_review_date: NaiveDate,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// The item actually moved up (a correct answer below box 5).
    pub advanced: bool,
    /// The answer was wrong and the item went back to box 1.
    pub demoted: bool,
}

/// Per-item progress summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatistics {
    pub item_id: String,
    pub box_number: u8,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_reviews: u32,
    /// Percent correct, two decimals; 0 before the first review.
    pub accuracy: f64,
    pub next_review_date: NaiveDate,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Negative when overdue.
    pub days_until_review: i64,
    pub is_due: bool,
}

/// Box an item lands in after a review from `previous_box`.
pub fn next_box(previous_box: u8, was_correct: bool) -> u8 {
    if was_correct {
        previous_box.saturating_add(1).min(MAX_BOX)
    } else {
        MIN_BOX
    }
}

fn require_id(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyId(field).into());
    }
    Ok(())
}

/// Scheduling engine over a record store.
pub struct Scheduler<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RecordStore> Scheduler<S> {
    /// Create a scheduler on the wall clock.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: RecordStore, C: Clock> Scheduler<S, C> {
    /// Create with a custom clock
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enter an item into scheduling: box 1, due today.
    ///
    /// # Errors
    /// Validation errors for empty ids, duplicate items or unknown categories.
    pub fn register_item(&self, item: Item) -> Result<ScheduleRecord> {
        require_id(&item.id, "item_id")?;
        require_id(&item.subject_id, "subject_id")?;
        require_id(&item.category_id, "category_id")?;

        let record = ScheduleRecord::new(item.id.clone(), self.clock.today());
        self.store.register_item(&item, &record)?;
        tracing::debug!(
            item_id = %item.id,
            subject_id = %item.subject_id,
            category_id = %item.category_id,
            "item registered"
        );
        Ok(record)
    }

    /// Items whose next review date is today or earlier.
    ///
    /// # Arguments
    /// * `filter` - Optional subject/category narrowing
    /// * `order` - Creation time ascending/descending, or a fresh shuffle
    /// * `limit` - Applied after ordering
    ///
    /// # Returns
    /// The due items with their records; empty when nothing is due.
    pub fn get_due_items(
        &self,
        filter: &DueFilter,
        order: ReviewOrder,
        limit: Option<usize>,
    ) -> Result<Vec<ScheduledItem>> {
        let today = self.clock.today();
        let record_filter = RecordFilter {
            due_on_or_before: Some(today),
            subject_id: filter.subject_id.clone(),
            category_id: filter.category_id.clone(),
            box_number: None,
        };
        let mut due = self.store.query_schedule_records(&record_filter)?;
        let total_due = due.len();

        let by_creation = |a: &ScheduledItem, b: &ScheduledItem| {
            a.item
                .created_at
                .cmp(&b.item.created_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        };
        match order {
            ReviewOrder::OldestFirst => due.sort_by(by_creation),
            ReviewOrder::NewestFirst => due.sort_by(|a, b| by_creation(b, a)),
            ReviewOrder::Random => due.shuffle(&mut rand::thread_rng()),
        }

        if let Some(limit) = limit {
            due.truncate(limit);
        }

        tracing::debug!(%today, %order, total_due, returned = due.len(), "due items selected");
        Ok(due)
    }

    /// Due items for one review session: the settings pick the order and cap
    /// the count at `cards_per_session`.
    pub fn due_items_for_session(
        &self,
        filter: &DueFilter,
        settings: &ReviewSettings,
    ) -> Result<Vec<ScheduledItem>> {
        let limit = usize::try_from(settings.cards_per_session).unwrap_or(usize::MAX);
        self.get_due_items(filter, settings.review_order, Some(limit))
    }

    /// Apply a review outcome to an item.
    ///
    /// Updates the schedule record and appends a review log entry as one
    /// atomic unit.
    ///
    /// # Errors
    /// [`CoreError::RecordNotFound`] when the item has no schedule record.
    pub fn process_review(
        &self,
        item_id: &str,
        subject_id: &str,
        was_correct: bool,
        time_spent_seconds: Option<u32>,
    ) -> Result<ReviewOutcome> {
        require_id(subject_id, "subject_id")?;

        let now = self.clock.now();
        let today = now.date_naive();
        let mut previous_box = MIN_BOX;

        let updated = self
            .store
            .modify_schedule_record(item_id, &mut |current: &ScheduleRecord| {
                previous_box = current.box_number;
                let new_box = next_box(current.box_number, was_correct);

                let mut record = current.clone();
                record.box_number = new_box;
                record.next_review_date = intervals::next_review_date(new_box, today)?;
                record.last_reviewed_at = Some(now);
                if was_correct {
                    record.correct_count = record.correct_count.saturating_add(1);
                } else {
                    record.incorrect_count = record.incorrect_count.saturating_add(1);
                }

                Ok(RecordChange {
                    record,
                    log_entry: Some(ReviewLogEntry {
                        item_id: item_id.to_string(),
                        subject_id: subject_id.to_string(),
                        occurred_at: now,
                        was_correct,
                        time_spent_seconds,
                    }),
                })
            })?
            .ok_or_else(|| CoreError::not_found(item_id))?;

        let outcome = ReviewOutcome {
            item_id: item_id.to_string(),
            previous_box,
            new_box: updated.box_number,
            next_review_date: updated.next_review_date,
            correct_count: updated.correct_count,
            incorrect_count: updated.incorrect_count,
            advanced: was_correct && previous_box < MAX_BOX,
            demoted: !was_correct,
        };
        tracing::debug!(
            item_id,
            subject_id,
            was_correct,
            previous_box = outcome.previous_box,
            new_box = outcome.new_box,
            next_review = %outcome.next_review_date,
            "review processed"
        );
        Ok(outcome)
    }

    /// Send an item back to box 1, due today, as if never reviewed.
    ///
    /// Counters and the review log are untouched. Idempotent.
    ///
    /// # Errors
    /// [`CoreError::RecordNotFound`] when the item has no schedule record.
    pub fn reset_item(&self, item_id: &str) -> Result<ScheduleRecord> {
        let today = self.clock.today();
        let record = self
            .store
            .modify_schedule_record(item_id, &mut |current: &ScheduleRecord| {
                Ok(RecordChange {
                    record: ScheduleRecord {
                        box_number: MIN_BOX,
                        next_review_date: today,
                        last_reviewed_at: None,
                        ..current.clone()
                    },
                    log_entry: None,
                })
            })?
            .ok_or_else(|| CoreError::not_found(item_id))?;
        tracing::debug!(item_id, "item reset to box 1");
        Ok(record)
    }

    /// Progress summary for one item.
    ///
    /// # Errors
    /// [`CoreError::RecordNotFound`] when the item has no schedule record.
    pub fn item_statistics(&self, item_id: &str) -> Result<ItemStatistics> {
        let record = self
            .store
            .get_schedule_record(item_id)?
            .ok_or_else(|| CoreError::not_found(item_id))?;
        let today = self.clock.today();
        let total_reviews = record.total_reviews();

        Ok(ItemStatistics {
            accuracy: percentage(u64::from(record.correct_count), u64::from(total_reviews)),
            days_until_review: intervals::days_until(record.next_review_date, today),
            is_due: intervals::is_due(record.next_review_date, today),
            item_id: record.item_id,
            box_number: record.box_number,
            correct_count: record.correct_count,
            incorrect_count: record.incorrect_count,
            total_reviews,
            next_review_date: record.next_review_date,
            last_reviewed_at: record.last_reviewed_at,
        })
    }
}

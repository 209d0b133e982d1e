//! In-memory record store.
//!
//! One mutex guards all state, so every operation (including the review
//! read-modify-write) is serialized.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::{RecordChange, RecordFilter, RecordStore, ReviewLogFilter};
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::model::{Category, Item, ReviewLogEntry, ScheduleRecord, ScheduledItem};

#[derive(Debug, Default)]
struct State {
    categories: HashMap<String, Category>,
    items: HashMap<String, Item>,
    records: HashMap<String, ScheduleRecord>,
    log: Vec<ReviewLogEntry>,
}

impl State {
    fn require_item(&self, item_id: &str) -> Result<()> {
        if self.items.contains_key(item_id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownReference {
                kind: "item",
                id: item_id.to_string(),
            }
            .into())
        }
    }

    fn append(&mut self, entry: ReviewLogEntry) {
        // Keep the log sorted by occurred_at; ties keep insertion order.
        let at = self.log.partition_point(|e| e.occurred_at <= entry.occurred_at);
        self.log.insert(at, entry);
    }
}

/// Record store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| CoreError::Store(StoreError::Poisoned))
    }
}

impl RecordStore for MemoryStore {
    fn register_category(&self, category: &Category) -> Result<()> {
        let mut state = self.lock()?;
        if state.categories.contains_key(&category.id) {
            return Err(ValidationError::Duplicate {
                kind: "category",
                id: category.id.clone(),
            }
            .into());
        }
        state
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.lock()?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    fn register_item(&self, item: &Item, initial: &ScheduleRecord) -> Result<()> {
        let mut state = self.lock()?;
        if state.items.contains_key(&item.id) {
            return Err(ValidationError::Duplicate {
                kind: "item",
                id: item.id.clone(),
            }
            .into());
        }
        if !state.categories.contains_key(&item.category_id) {
            return Err(ValidationError::UnknownReference {
                kind: "category",
                id: item.category_id.clone(),
            }
            .into());
        }
        state.items.insert(item.id.clone(), item.clone());
        state.records.insert(item.id.clone(), initial.clone());
        Ok(())
    }

    fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        Ok(self.lock()?.items.get(item_id).cloned())
    }

    fn get_schedule_record(&self, item_id: &str) -> Result<Option<ScheduleRecord>> {
        Ok(self.lock()?.records.get(item_id).cloned())
    }

    fn upsert_schedule_record(&self, record: &ScheduleRecord) -> Result<()> {
        let mut state = self.lock()?;
        state.require_item(&record.item_id)?;
        state
            .records
            .insert(record.item_id.clone(), record.clone());
        Ok(())
    }

    fn append_review_log(&self, entry: &ReviewLogEntry) -> Result<()> {
        let mut state = self.lock()?;
        state.require_item(&entry.item_id)?;
        state.append(entry.clone());
        Ok(())
    }

    fn modify_schedule_record(
        &self,
        item_id: &str,
        modify: &mut dyn FnMut(&ScheduleRecord) -> Result<RecordChange>,
    ) -> Result<Option<ScheduleRecord>> {
        let mut state = self.lock()?;
        let Some(current) = state.records.get(item_id) else {
            return Ok(None);
        };
        let change = modify(current)?;
        if change.record.item_id != item_id {
            return Err(ValidationError::InvalidValue {
                field: "item_id".to_string(),
                message: format!(
                    "modified record belongs to '{}', expected '{item_id}'",
                    change.record.item_id
                ),
            }
            .into());
        }
        state
            .records
            .insert(item_id.to_string(), change.record.clone());
        if let Some(entry) = change.log_entry {
            state.append(entry);
        }
        Ok(Some(change.record))
    }

    fn query_schedule_records(&self, filter: &RecordFilter) -> Result<Vec<ScheduledItem>> {
        let state = self.lock()?;
        let mut scheduled: Vec<ScheduledItem> = state
            .records
            .values()
            .filter_map(|record| {
                state.items.get(&record.item_id).map(|item| ScheduledItem {
                    item: item.clone(),
                    record: record.clone(),
                })
            })
            .filter(|s| filter.matches(s))
            .collect();
        scheduled.sort_by(|a, b| {
            a.item
                .created_at
                .cmp(&b.item.created_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        Ok(scheduled)
    }

    fn query_review_log(&self, filter: &ReviewLogFilter) -> Result<Vec<ReviewLogEntry>> {
        let state = self.lock()?;
        let entries = state
            .log
            .iter()
            .filter(|entry| filter.matches_entry(entry))
            .filter(|entry| match filter.category_id.as_deref() {
                Some(category_id) => state
                    .items
                    .get(&entry.item_id)
                    .is_some_and(|item| item.category_id == category_id),
                None => true,
            })
            .cloned()
            .collect();
        Ok(entries)
    }

    fn list_distinct_review_dates(&self, subject_id: &str) -> Result<Vec<NaiveDate>> {
        let state = self.lock()?;
        let mut dates: Vec<NaiveDate> = state
            .log
            .iter()
            .filter(|entry| entry.subject_id == subject_id)
            .map(|entry| entry.occurred_at.date_naive())
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }
}

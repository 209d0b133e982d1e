//! Per-category mastery and accuracy.

use serde::{Deserialize, Serialize};

use super::{percentage, Analytics, BoxDistribution};
use crate::clock::Clock;
use crate::error::Result;
use crate::intervals::{self, MAX_BOX};
use crate::storage::{RecordFilter, RecordStore, ReviewLogFilter};

/// One row of the category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub category_id: String,
    pub category_name: String,
    pub total_items: u64,
    /// Items in box 5.
    pub mastered: u64,
    pub mastered_percent: f64,
    pub total_reviews: u64,
    pub accuracy: f64,
}

/// Box breakdown of a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category_id: String,
    pub total_items: u64,
    pub box_distribution: BoxDistribution,
    pub due_today: u64,
    pub mastered: u64,
    pub mastered_percent: f64,
}

impl<S: RecordStore, C: Clock> Analytics<S, C> {
    /// One row per category holding at least one of the subject's items,
    /// in category name order.
    pub fn category_statistics(&self, subject_id: &str) -> Result<Vec<CategoryStatistics>> {
        let categories = self.store.list_categories()?;
        let scheduled = self
            .store
            .query_schedule_records(&RecordFilter::all().for_subject(subject_id))?;

        let mut rows = Vec::new();
        for category in categories {
            let in_category: Vec<_> = scheduled
                .iter()
                .filter(|s| s.item.category_id == category.id)
                .collect();
            if in_category.is_empty() {
                continue;
            }

            let total_items = in_category.len() as u64;
            let mastered = in_category
                .iter()
                .filter(|s| s.record.box_number == MAX_BOX)
                .count() as u64;

            let log = self.store.query_review_log(
                &ReviewLogFilter::for_subject(subject_id).in_category(category.id.as_str()),
            )?;
            let total_reviews = log.len() as u64;
            let correct = log.iter().filter(|e| e.was_correct).count() as u64;

            rows.push(CategoryStatistics {
                category_id: category.id,
                category_name: category.name,
                total_items,
                mastered,
                mastered_percent: percentage(mastered, total_items),
                total_reviews,
                accuracy: percentage(correct, total_reviews),
            });
        }
        Ok(rows)
    }

    /// Box breakdown of one category for a subject. Unknown or empty
    /// categories report zeros.
    pub fn category_progress(&self, category_id: &str, subject_id: &str) -> Result<CategoryProgress> {
        let today = self.clock.today();
        let scheduled = self.store.query_schedule_records(
            &RecordFilter::all()
                .for_subject(subject_id)
                .in_category(category_id),
        )?;

        let box_distribution = BoxDistribution::from_records(scheduled.iter().map(|s| &s.record));
        let total_items = scheduled.len() as u64;
        let mastered = box_distribution.count(MAX_BOX);
        let due_today = scheduled
            .iter()
            .filter(|s| intervals::is_due(s.record.next_review_date, today))
            .count() as u64;

        Ok(CategoryProgress {
            category_id: category_id.to_string(),
            total_items,
            box_distribution,
            due_today,
            mastered,
            mastered_percent: percentage(mastered, total_items),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{Category, Item, ScheduleRecord};
    use crate::storage::MemoryStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn seeded() -> Analytics<MemoryStore, FixedClock> {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let store = MemoryStore::new();
        for (id, name) in [("nouns", "Nouns"), ("verbs", "Verbs"), ("idioms", "Idioms")] {
            store
                .register_category(&Category {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .unwrap();
        }
        let cards = [("n1", "nouns", 5), ("n2", "nouns", 2), ("n3", "nouns", 5), ("v1", "verbs", 1)];
        for (id, category, box_number) in cards {
            let item = Item {
                id: id.to_string(),
                subject_id: "ana".to_string(),
                category_id: category.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            };
            let due = if box_number == 5 {
                today.succ_opt().unwrap()
            } else {
                today
            };
            store
                .register_item(
                    &item,
                    &ScheduleRecord {
                        box_number,
                        next_review_date: due,
                        ..ScheduleRecord::new(id, today)
                    },
                )
                .unwrap();
        }
        Analytics::with_clock(store, FixedClock::on_date(today))
    }

    #[test]
    fn rows_skip_empty_categories_and_follow_name_order() {
        let rows = seeded().category_statistics("ana").unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.category_name.as_str()).collect();
        assert_eq!(names, vec!["Nouns", "Verbs"]);

        let nouns = &rows[0];
        assert_eq!(nouns.total_items, 3);
        assert_eq!(nouns.mastered, 2);
        assert_eq!(nouns.mastered_percent, 66.67);
        assert_eq!(nouns.total_reviews, 0);
        assert_eq!(nouns.accuracy, 0.0);
    }

    #[test]
    fn unknown_subject_has_no_rows() {
        assert!(seeded().category_statistics("ben").unwrap().is_empty());
    }

    #[test]
    fn progress_breaks_down_one_category() {
        let analytics = seeded();
        let progress = analytics.category_progress("nouns", "ana").unwrap();
        assert_eq!(progress.total_items, 3);
        assert_eq!(progress.box_distribution.count(5), 2);
        assert_eq!(progress.box_distribution.count(2), 1);
        assert_eq!(progress.due_today, 1);
        assert_eq!(progress.mastered_percent, 66.67);

        let empty = analytics.category_progress("idioms", "ana").unwrap();
        assert_eq!(empty.total_items, 0);
        assert_eq!(empty.mastered_percent, 0.0);
        assert_eq!(empty.box_distribution, BoxDistribution::default());
    }
}

//! Subject-wide progress summary.

use serde::{Deserialize, Serialize};

use super::{percentage, Analytics, BoxDistribution};
use crate::clock::Clock;
use crate::error::Result;
use crate::intervals::{self, MAX_BOX};
use crate::storage::{RecordFilter, RecordStore, ReviewLogFilter};

/// Headline numbers for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_items: u64,
    pub total_reviews: u64,
    pub reviews_today: u64,
    pub items_due: u64,
    pub box_distribution: BoxDistribution,
    /// Percent of reviews answered correctly, 0 without reviews.
    pub overall_accuracy: f64,
    /// Items in box 5.
    pub mastered_count: u64,
}

impl<S: RecordStore, C: Clock> Analytics<S, C> {
    /// Overview of a subject's items and reviews.
    pub fn overview(&self, subject_id: &str) -> Result<Overview> {
        let today = self.clock.today();

        let scheduled = self
            .store
            .query_schedule_records(&RecordFilter::all().for_subject(subject_id))?;
        let box_distribution = BoxDistribution::from_records(scheduled.iter().map(|s| &s.record));
        let items_due = scheduled
            .iter()
            .filter(|s| intervals::is_due(s.record.next_review_date, today))
            .count() as u64;

        let log = self
            .store
            .query_review_log(&ReviewLogFilter::for_subject(subject_id))?;
        let total_reviews = log.len() as u64;
        let correct_reviews = log.iter().filter(|e| e.was_correct).count() as u64;
        let reviews_today = log
            .iter()
            .filter(|e| e.occurred_at.date_naive() == today)
            .count() as u64;

        Ok(Overview {
            total_items: scheduled.len() as u64,
            total_reviews,
            reviews_today,
            items_due,
            overall_accuracy: percentage(correct_reviews, total_reviews),
            mastered_count: box_distribution.count(MAX_BOX),
            box_distribution,
        })
    }
}

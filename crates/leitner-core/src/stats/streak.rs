//! Runs of consecutive review days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Analytics;
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::RecordStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStreak {
    /// Consecutive review days ending today or yesterday.
    pub current_streak: u32,
    /// Longest run of consecutive review days ever.
    pub longest_streak: u32,
}

fn is_next_day(later: NaiveDate, earlier: NaiveDate) -> bool {
    earlier.succ_opt() == Some(later)
}

/// Streaks over `dates` as seen on `today`.
///
/// Order and duplicates in `dates` do not matter. Dates after `today` are
/// ignored.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> LearningStreak {
    let mut days: Vec<NaiveDate> = dates.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&latest) = days.first() else {
        return LearningStreak::default();
    };

    let mut current_streak = 0;
    if latest == today || is_next_day(today, latest) {
        current_streak = 1;
        for pair in days.windows(2) {
            if !is_next_day(pair[0], pair[1]) {
                break;
            }
            current_streak += 1;
        }
    }

    let mut longest_streak = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if is_next_day(pair[0], pair[1]) {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 1;
        }
    }

    LearningStreak {
        current_streak,
        longest_streak,
    }
}

impl<S: RecordStore, C: Clock> Analytics<S, C> {
    pub fn learning_streak(&self, subject_id: &str) -> Result<LearningStreak> {
        let dates = self.store.list_distinct_review_dates(subject_id)?;
        let streak = compute_streak(&dates, self.clock.today());
        tracing::trace!(
            subject_id,
            review_days = dates.len(),
            current = streak.current_streak,
            longest = streak.longest_streak,
            "streak computed"
        );
        Ok(streak)
    }
}

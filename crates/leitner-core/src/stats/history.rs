//! Daily review series.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Analytics;
use crate::clock::Clock;
use crate::error::Result;
use crate::model::ReviewLogEntry;
use crate::storage::{RecordStore, ReviewLogFilter};

/// Parallel per-day series, oldest day first.
///
/// `incorrects[i] == totals[i] - corrects[i]` for every day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewHistory {
    pub dates: Vec<NaiveDate>,
    pub totals: Vec<u32>,
    pub corrects: Vec<u32>,
    pub incorrects: Vec<u32>,
}

/// Bucket `entries` into `window_days` consecutive days ending on `end`.
///
/// Entries outside the window are ignored; days without entries are zero.
pub fn bucket_by_day(entries: &[ReviewLogEntry], end: NaiveDate, window_days: u32) -> ReviewHistory {
    let len = window_days as usize;
    if len == 0 {
        return ReviewHistory::default();
    }
    let start = end
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);

    let mut history = ReviewHistory {
        dates: start.iter_days().take(len).collect(),
        totals: vec![0; len],
        corrects: vec![0; len],
        incorrects: vec![0; len],
    };

    for entry in entries {
        let offset = (entry.occurred_at.date_naive() - start).num_days();
        let Ok(idx) = usize::try_from(offset) else {
            continue;
        };
        if idx >= history.dates.len() {
            continue;
        }
        history.totals[idx] += 1;
        if entry.was_correct {
            history.corrects[idx] += 1;
        } else {
            history.incorrects[idx] += 1;
        }
    }
    history
}

impl<S: RecordStore, C: Clock> Analytics<S, C> {
    /// Reviews per day over the last `window_days` days, today included.
    pub fn review_history(&self, subject_id: &str, window_days: u32) -> Result<ReviewHistory> {
        let today = self.clock.today();
        let since = today
            .checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        let entries = self.store.query_review_log(
            &ReviewLogFilter::for_subject(subject_id)
                .since(since)
                .until(today),
        )?;
        Ok(bucket_by_day(&entries, today, window_days))
    }
}

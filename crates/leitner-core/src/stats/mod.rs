//! Analytics over schedule records and the review log.
//!
//! Every query is read-only and total: empty data yields zero counts, zero
//! accuracy and zero streaks rather than errors.
//!
//! - `overview`: item/review counts, box histogram, accuracy, mastery
//! - `history`: dense per-day review series ending today
//! - `category`: per-category mastery and accuracy
//! - `streak`: current and longest runs of review days

mod category;
mod history;
mod overview;
mod streak;

pub use category::{CategoryProgress, CategoryStatistics};
pub use history::{bucket_by_day, ReviewHistory};
pub use overview::Overview;
pub use streak::{compute_streak, LearningStreak};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::intervals::{MAX_BOX, MIN_BOX};
use crate::model::ScheduleRecord;
use crate::storage::RecordStore;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100`, two decimals, 0 when `whole` is 0.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Item count per box. Always holds all five boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxDistribution(BTreeMap<u8, u64>);

impl Default for BoxDistribution {
    fn default() -> Self {
        Self((MIN_BOX..=MAX_BOX).map(|b| (b, 0)).collect())
    }
}

impl BoxDistribution {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ScheduleRecord>) -> Self {
        let mut distribution = Self::default();
        for record in records {
            if let Some(count) = distribution.0.get_mut(&record.box_number) {
                *count += 1;
            }
        }
        distribution
    }

    pub fn count(&self, box_number: u8) -> u64 {
        self.0.get(&box_number).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// `(box, count)` pairs in box order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.0.iter().map(|(b, c)| (*b, *c))
    }
}

/// Analytics engine over a record store.
pub struct Analytics<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RecordStore> Analytics<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: RecordStore, C: Clock> Analytics<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

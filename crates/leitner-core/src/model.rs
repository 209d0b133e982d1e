//! Domain types shared by the scheduling and analytics engines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::intervals::{MAX_BOX, MIN_BOX};

/// Scheduling state of one learning item.
///
/// Created once when the item enters scheduling (box 1, due today) and
/// afterwards changed only by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub item_id: String,
    /// Always within 1..=5.
    pub box_number: u8,
    pub next_review_date: NaiveDate,
    /// `None` until the first review (and again after a reset).
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl ScheduleRecord {
    /// Fresh record: box 1, due on `today`, no history.
    pub fn new(item_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            item_id: item_id.into(),
            box_number: MIN_BOX,
            next_review_date: today,
            last_reviewed_at: None,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn total_reviews(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    pub fn is_mastered(&self) -> bool {
        self.box_number == MAX_BOX
    }
}

/// One review action. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub item_id: String,
    /// The reviewing party.
    pub subject_id: String,
    pub occurred_at: DateTime<Utc>,
    pub was_correct: bool,
    pub time_spent_seconds: Option<u32>,
}

/// Reference to a learning item owned by an external content model.
///
/// The engine only needs the owner, the category and the creation time
/// (for oldest/newest ordering); content lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub subject_id: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
}

/// An item together with its current schedule record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub item: Item,
    pub record: ScheduleRecord,
}

/// Aggregation key for analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Ordering policy for due items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOrder {
    /// Fresh uniform shuffle on every call.
    #[default]
    Random,
    /// Item creation time ascending.
    OldestFirst,
    /// Item creation time descending.
    NewestFirst,
}

impl ReviewOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOrder::Random => "random",
            ReviewOrder::OldestFirst => "oldest_first",
            ReviewOrder::NewestFirst => "newest_first",
        }
    }
}

impl fmt::Display for ReviewOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(ReviewOrder::Random),
            "oldest_first" => Ok(ReviewOrder::OldestFirst),
            "newest_first" => Ok(ReviewOrder::NewestFirst),
            other => Err(ValidationError::InvalidValue {
                field: "review_order".to_string(),
                message: format!(
                    "expected one of random, oldest_first, newest_first; got '{other}'"
                ),
            }),
        }
    }
}

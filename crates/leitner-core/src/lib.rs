//! # Leitner Core Library
//!
//! Spaced-repetition scheduling with a fixed five-box Leitner policy, plus
//! progress analytics derived from the review log. The CLI in `leitner-cli`
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Intervals**: box → interval table and calendar-date arithmetic
//! - **Scheduler**: applies review outcomes, resets items and selects due items
//! - **Analytics**: overview, daily history, per-category stats and streaks
//! - **Storage**: the [`RecordStore`] contract with SQLite and in-memory stores
//!
//! ## Key Components
//!
//! - [`Scheduler`]: box transitions and due-item selection
//! - [`Analytics`]: read-only aggregates
//! - [`SqliteStore`] / [`MemoryStore`]: persistence
//! - [`Settings`]: TOML review configuration
//! - [`Clock`]: injectable "now", so tests can pin the calendar

pub mod answer;
pub mod clock;
pub mod error;
pub mod intervals;
pub mod model;
pub mod scheduler;
pub mod settings;
pub mod stats;
pub mod storage;

pub use answer::{check_answer, similarity, Strictness};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, StoreError, ValidationError};
pub use intervals::{interval_for_box, next_review_date, MAX_BOX, MIN_BOX};
pub use model::{Category, Item, ReviewLogEntry, ReviewOrder, ScheduleRecord, ScheduledItem};
pub use scheduler::{DueFilter, ItemStatistics, ReviewOutcome, Scheduler};
pub use settings::{AnswerMode, ReviewSettings, Settings, UiSettings};
pub use stats::{
    Analytics, BoxDistribution, CategoryProgress, CategoryStatistics, LearningStreak, Overview,
    ReviewHistory,
};
pub use storage::{
    MemoryStore, RecordChange, RecordFilter, RecordStore, ReviewLogFilter, SqliteStore,
};

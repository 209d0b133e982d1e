use clap::Subcommand;
use leitner_core::{check_answer, similarity, DueFilter, ReviewOrder, Scheduler, Strictness};
use serde::Serialize;

use super::{load_settings, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ReviewAction {
    /// List items due today
    Due {
        /// Subject ID
        #[arg(long)]
        subject: String,
        /// Only items in this category
        #[arg(long)]
        category: Option<String>,
        /// random, oldest_first or newest_first (default from settings)
        #[arg(long)]
        order: Option<ReviewOrder>,
        /// Maximum items, capped by review.cards_per_session
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record a review answer
    Answer {
        /// Item ID
        item_id: String,
        /// Subject ID
        #[arg(long)]
        subject: String,
        /// The answer was right
        #[arg(long, conflicts_with = "incorrect", required_unless_present = "incorrect")]
        correct: bool,
        /// The answer was wrong
        #[arg(long)]
        incorrect: bool,
        /// Seconds spent on the item
        #[arg(long)]
        time_spent: Option<u32>,
    },
    /// Grade a typed answer with the configured strictness
    Check {
        /// Answer given
        given: String,
        /// Expected answer
        expected: String,
    },
}

#[derive(Serialize)]
struct CheckResult {
    correct: bool,
    similarity: f64,
    strictness: Strictness,
}

pub fn run(action: ReviewAction) -> CmdResult {
    match action {
        ReviewAction::Due {
            subject,
            category,
            order,
            limit,
        } => {
            let settings = load_settings()?.review;
            let cap = usize::try_from(settings.cards_per_session).unwrap_or(usize::MAX);
            let order = order.unwrap_or(settings.review_order);
            let limit = limit.map_or(cap, |l| l.min(cap));

            let filter = DueFilter {
                subject_id: Some(subject),
                category_id: category,
            };
            let scheduler = Scheduler::new(open_store()?);
            let due = scheduler.get_due_items(&filter, order, Some(limit))?;
            print_json(&due)?;
        }
        ReviewAction::Answer {
            item_id,
            subject,
            correct,
            incorrect: _,
            time_spent,
        } => {
            let scheduler = Scheduler::new(open_store()?);
            let outcome = scheduler.process_review(&item_id, &subject, correct, time_spent)?;
            print_json(&outcome)?;
        }
        ReviewAction::Check { given, expected } => {
            let strictness = load_settings()?.review.answer_strictness;
            print_json(&CheckResult {
                correct: check_answer(&given, &expected, strictness),
                similarity: similarity(&given, &expected),
                strictness,
            })?;
        }
    }
    Ok(())
}

use clap::Subcommand;
use leitner_core::{Analytics, RecordStore};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Item and review totals, box distribution, accuracy
    Overview {
        #[arg(long)]
        subject: String,
    },
    /// Reviews per day, ending today
    History {
        #[arg(long)]
        subject: String,
        /// Window length in days
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Mastery and accuracy per category
    Categories {
        #[arg(long)]
        subject: String,
    },
    /// Current and longest review streak
    Streak {
        #[arg(long)]
        subject: String,
    },
    /// Box breakdown for one category, or every category
    Progress {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        category: Option<String>,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let analytics = Analytics::new(open_store()?);

    match action {
        StatsAction::Overview { subject } => {
            print_json(&analytics.overview(&subject)?)?;
        }
        StatsAction::History { subject, days } => {
            print_json(&analytics.review_history(&subject, days)?)?;
        }
        StatsAction::Categories { subject } => {
            print_json(&analytics.category_statistics(&subject)?)?;
        }
        StatsAction::Streak { subject } => {
            print_json(&analytics.learning_streak(&subject)?)?;
        }
        StatsAction::Progress {
            subject,
            category: Some(category),
        } => {
            print_json(&analytics.category_progress(&category, &subject)?)?;
        }
        StatsAction::Progress {
            subject,
            category: None,
        } => {
            let progress = analytics
                .store()
                .list_categories()?
                .iter()
                .map(|c| analytics.category_progress(&c.id, &subject))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&progress)?;
        }
    }
    Ok(())
}

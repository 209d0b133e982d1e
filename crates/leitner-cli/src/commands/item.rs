use chrono::Utc;
use clap::Subcommand;
use leitner_core::{CoreError, Item, ItemStatistics, RecordStore, ScheduleRecord, Scheduler};
use serde::Serialize;

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Start scheduling an item (box 1, due today)
    Add {
        /// Item ID
        item_id: String,
        /// Owning subject
        #[arg(long)]
        subject: String,
        /// Category ID
        #[arg(long)]
        category: String,
    },
    /// Show an item's schedule and statistics
    Show {
        /// Item ID
        item_id: String,
    },
    /// Send an item back to box 1, due today
    Reset {
        /// Item ID
        item_id: String,
    },
}

#[derive(Serialize)]
struct ItemView {
    item: Item,
    record: ScheduleRecord,
}

#[derive(Serialize)]
struct ItemDetails {
    item: Item,
    statistics: ItemStatistics,
}

pub fn run(action: ItemAction) -> CmdResult {
    let scheduler = Scheduler::new(open_store()?);

    match action {
        ItemAction::Add {
            item_id,
            subject,
            category,
        } => {
            let item = Item {
                id: item_id,
                subject_id: subject,
                category_id: category,
                created_at: Utc::now(),
            };
            let record = scheduler.register_item(item.clone())?;
            print_json(&ItemView { item, record })?;
        }
        ItemAction::Show { item_id } => {
            let statistics = scheduler.item_statistics(&item_id)?;
            let item = scheduler
                .store()
                .get_item(&item_id)?
                .ok_or(CoreError::RecordNotFound { item_id })?;
            print_json(&ItemDetails { item, statistics })?;
        }
        ItemAction::Reset { item_id } => {
            let record = scheduler.reset_item(&item_id)?;
            print_json(&record)?;
        }
    }
    Ok(())
}

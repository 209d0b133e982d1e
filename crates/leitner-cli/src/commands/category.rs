use clap::Subcommand;
use leitner_core::{Category, RecordStore};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Register a category
    Add {
        /// Category ID
        id: String,
        /// Display name
        name: String,
    },
    /// List categories by name
    List,
}

pub fn run(action: CategoryAction) -> CmdResult {
    let store = open_store()?;

    match action {
        CategoryAction::Add { id, name } => {
            let category = Category { id, name };
            store.register_category(&category)?;
            print_json(&category)?;
        }
        CategoryAction::List => {
            print_json(&store.list_categories()?)?;
        }
    }
    Ok(())
}

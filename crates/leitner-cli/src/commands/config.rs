use clap::Subcommand;
use leitner_core::Settings;

use super::{load_settings, print_json, settings_path, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "review.cards_per_session", "ui.theme")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let settings = load_settings()?;
            match settings.get(&key) {
                Some(value) => print_json(&serde_json::json!({ "key": key, "value": value }))?,
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = load_settings()?;
            settings.set(&key, &value)?;
            settings.save_to(&settings_path()?)?;
            print_json(&serde_json::json!({ "key": key, "value": settings.get(&key) }))?;
        }
        ConfigAction::List => {
            print_json(&load_settings()?)?;
        }
        ConfigAction::Reset => {
            let settings = Settings::default();
            settings.save_to(&settings_path()?)?;
            print_json(&settings)?;
        }
    }
    Ok(())
}

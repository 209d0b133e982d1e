pub mod category;
pub mod config;
pub mod item;
pub mod review;
pub mod stats;

use std::error::Error;
use std::path::PathBuf;

use leitner_core::{Settings, SqliteStore};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn Error>>;

const DB_FILE: &str = "leitner.db";
const SETTINGS_FILE: &str = "settings.toml";

/// Data directory: `$LEITNER_HOME`, else `~/.config/leitner[-dev]/`.
///
/// Set LEITNER_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, Box<dyn Error>> {
    let dir = match std::env::var_os("LEITNER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LEITNER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("leitner-dev")
            } else {
                base_dir.join("leitner")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn open_store() -> Result<SqliteStore, Box<dyn Error>> {
    let path = data_dir()?.join(DB_FILE);
    tracing::debug!(path = %path.display(), "opening record store");
    Ok(SqliteStore::open(path)?)
}

pub fn settings_path() -> Result<PathBuf, Box<dyn Error>> {
    Ok(data_dir()?.join(SETTINGS_FILE))
}

pub fn load_settings() -> Result<Settings, Box<dyn Error>> {
    Ok(Settings::load_from(&settings_path()?)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Database schema migrations for the SQLite record store.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Schema version produced by [`migrate`].
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: categories, items, schedule records and the review log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id   TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            id          TEXT PRIMARY KEY,
            subject_id  TEXT NOT NULL,
            category_id TEXT NOT NULL REFERENCES categories(id),
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_records (
            item_id          TEXT PRIMARY KEY REFERENCES items(id) ON DELETE CASCADE,
            box_number       INTEGER NOT NULL DEFAULT 1 CHECK (box_number BETWEEN 1 AND 5),
            next_review_date TEXT NOT NULL,
            last_reviewed_at TEXT,
            correct_count    INTEGER NOT NULL DEFAULT 0 CHECK (correct_count >= 0),
            incorrect_count  INTEGER NOT NULL DEFAULT 0 CHECK (incorrect_count >= 0)
        );

        CREATE TABLE IF NOT EXISTS review_log (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id            TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            subject_id         TEXT NOT NULL,
            occurred_at        TEXT NOT NULL,
            was_correct        INTEGER NOT NULL,
            time_spent_seconds INTEGER CHECK (time_spent_seconds IS NULL OR time_spent_seconds >= 0)
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: indexes for the due-item and analytics query patterns.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_schedule_records_next_review
             ON schedule_records(next_review_date);
         CREATE INDEX IF NOT EXISTS idx_items_subject_category
             ON items(subject_id, category_id);
         CREATE INDEX IF NOT EXISTS idx_review_log_subject_occurred
             ON review_log(subject_id, occurred_at);
         CREATE INDEX IF NOT EXISTS idx_review_log_item
             ON review_log(item_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}

//! SQLite-backed record store.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 UTC with
//! millisecond precision, so both sort lexicographically. The review unit runs
//! under `BEGIN IMMEDIATE`, which takes the write lock before the record is
//! read; concurrent reviewers on other connections wait on `busy_timeout`.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{migrations, RecordChange, RecordFilter, RecordStore, ReviewLogFilter};
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::intervals::{MAX_BOX, MIN_BOX};
use crate::model::{Category, Item, ReviewLogEntry, ScheduleRecord, ScheduledItem};

const DATE_FORMAT: &str = "%Y-%m-%d";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// === Helper Functions ===

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp of midnight UTC starting `date`, in stored form.
fn day_start(date: NaiveDate) -> String {
    format_timestamp(&date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("date '{value}': {e}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{value}': {e}")))
}

fn decode_box(value: i64) -> Result<u8, StoreError> {
    u8::try_from(value)
        .ok()
        .filter(|b| (MIN_BOX..=MAX_BOX).contains(b))
        .ok_or_else(|| StoreError::Corrupt(format!("box number {value}")))
}

fn decode_count(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} {value}")))
}

/// Schedule record columns as stored, decoded after the row callback returns.
struct RawRecord {
    item_id: String,
    box_number: i64,
    next_review_date: String,
    last_reviewed_at: Option<String>,
    correct_count: i64,
    incorrect_count: i64,
}

impl RawRecord {
    /// Reads six record columns starting at `offset`.
    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(offset)?,
            box_number: row.get(offset + 1)?,
            next_review_date: row.get(offset + 2)?,
            last_reviewed_at: row.get(offset + 3)?,
            correct_count: row.get(offset + 4)?,
            incorrect_count: row.get(offset + 5)?,
        })
    }

    fn decode(self) -> Result<ScheduleRecord, StoreError> {
        Ok(ScheduleRecord {
            item_id: self.item_id,
            box_number: decode_box(self.box_number)?,
            next_review_date: parse_date(&self.next_review_date)?,
            last_reviewed_at: self
                .last_reviewed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            correct_count: decode_count(self.correct_count, "correct_count")?,
            incorrect_count: decode_count(self.incorrect_count, "incorrect_count")?,
        })
    }
}

struct RawItem {
    id: String,
    subject_id: String,
    category_id: String,
    created_at: String,
}

impl RawItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject_id: row.get(1)?,
            category_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Item, StoreError> {
        Ok(Item {
            id: self.id,
            subject_id: self.subject_id,
            category_id: self.category_id,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

struct RawLogEntry {
    item_id: String,
    subject_id: String,
    occurred_at: String,
    was_correct: bool,
    time_spent_seconds: Option<i64>,
}

impl RawLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(0)?,
            subject_id: row.get(1)?,
            occurred_at: row.get(2)?,
            was_correct: row.get(3)?,
            time_spent_seconds: row.get(4)?,
        })
    }

    fn decode(self) -> Result<ReviewLogEntry, StoreError> {
        Ok(ReviewLogEntry {
            item_id: self.item_id,
            subject_id: self.subject_id,
            occurred_at: parse_timestamp(&self.occurred_at)?,
            was_correct: self.was_correct,
            time_spent_seconds: self
                .time_spent_seconds
                .map(|secs| decode_count(secs, "time_spent_seconds"))
                .transpose()?,
        })
    }
}

fn load_record(conn: &Connection, item_id: &str) -> Result<Option<ScheduleRecord>> {
    let raw = conn
        .query_row(
            "SELECT item_id, box_number, next_review_date, last_reviewed_at,
                    correct_count, incorrect_count
             FROM schedule_records WHERE item_id = ?1",
            params![item_id],
            |row| RawRecord::from_row(row, 0),
        )
        .optional()?;
    Ok(raw.map(RawRecord::decode).transpose()?)
}

fn write_record(conn: &Connection, record: &ScheduleRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO schedule_records
             (item_id, box_number, next_review_date, last_reviewed_at, correct_count, incorrect_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(item_id) DO UPDATE SET
             box_number = excluded.box_number,
             next_review_date = excluded.next_review_date,
             last_reviewed_at = excluded.last_reviewed_at,
             correct_count = excluded.correct_count,
             incorrect_count = excluded.incorrect_count",
        params![
            record.item_id,
            record.box_number,
            format_date(record.next_review_date),
            record.last_reviewed_at.as_ref().map(format_timestamp),
            record.correct_count,
            record.incorrect_count,
        ],
    )?;
    Ok(())
}

fn insert_log_entry(conn: &Connection, entry: &ReviewLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO review_log (item_id, subject_id, occurred_at, was_correct, time_spent_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.item_id,
            entry.subject_id,
            format_timestamp(&entry.occurred_at),
            entry.was_correct,
            entry.time_spent_seconds,
        ],
    )?;
    Ok(())
}

fn exists(conn: &Connection, sql: &str, id: &str) -> Result<bool> {
    let found = conn
        .query_row(sql, params![id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

fn require_item(conn: &Connection, item_id: &str) -> Result<()> {
    if exists(conn, "SELECT 1 FROM items WHERE id = ?1", item_id)? {
        Ok(())
    } else {
        Err(ValidationError::UnknownReference {
            kind: "item",
            id: item_id.to_string(),
        }
        .into())
    }
}

/// SQLite database holding items, schedule records and the review log.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and bring its schema up to date.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(StoreError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::from)?;
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        tracing::debug!(
            version = migrations::get_schema_version(&conn),
            "record store ready"
        );
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside `BEGIN IMMEDIATE`; commit on success, roll back on error.
    fn in_immediate_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(StoreError::from)?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;").map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

impl RecordStore for SqliteStore {
    fn register_category(&self, category: &Category) -> Result<()> {
        self.in_immediate_transaction(|conn| {
            if exists(conn, "SELECT 1 FROM categories WHERE id = ?1", &category.id)? {
                return Err(ValidationError::Duplicate {
                    kind: "category",
                    id: category.id.clone(),
                }
                .into());
            }
            conn.execute(
                "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                params![category.id, category.name],
            )?;
            Ok(())
        })
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    fn register_item(&self, item: &Item, initial: &ScheduleRecord) -> Result<()> {
        self.in_immediate_transaction(|conn| {
            if exists(conn, "SELECT 1 FROM items WHERE id = ?1", &item.id)? {
                return Err(ValidationError::Duplicate {
                    kind: "item",
                    id: item.id.clone(),
                }
                .into());
            }
            if !exists(conn, "SELECT 1 FROM categories WHERE id = ?1", &item.category_id)? {
                return Err(ValidationError::UnknownReference {
                    kind: "category",
                    id: item.category_id.clone(),
                }
                .into());
            }
            conn.execute(
                "INSERT INTO items (id, subject_id, category_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    item.id,
                    item.subject_id,
                    item.category_id,
                    format_timestamp(&item.created_at),
                ],
            )?;
            write_record(conn, initial)
        })
    }

    fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, subject_id, category_id, created_at FROM items WHERE id = ?1",
                params![item_id],
                RawItem::from_row,
            )
            .optional()?;
        Ok(raw.map(RawItem::decode).transpose()?)
    }

    fn get_schedule_record(&self, item_id: &str) -> Result<Option<ScheduleRecord>> {
        load_record(&self.conn, item_id)
    }

    fn upsert_schedule_record(&self, record: &ScheduleRecord) -> Result<()> {
        require_item(&self.conn, &record.item_id)?;
        write_record(&self.conn, record)
    }

    fn append_review_log(&self, entry: &ReviewLogEntry) -> Result<()> {
        require_item(&self.conn, &entry.item_id)?;
        insert_log_entry(&self.conn, entry)
    }

    fn modify_schedule_record(
        &self,
        item_id: &str,
        modify: &mut dyn FnMut(&ScheduleRecord) -> Result<RecordChange>,
    ) -> Result<Option<ScheduleRecord>> {
        self.in_immediate_transaction(|conn| {
            let Some(current) = load_record(conn, item_id)? else {
                return Ok(None);
            };
            let change = modify(&current)?;
            if change.record.item_id != item_id {
                return Err(CoreError::Validation(ValidationError::InvalidValue {
                    field: "item_id".to_string(),
                    message: format!(
                        "modified record belongs to '{}', expected '{item_id}'",
                        change.record.item_id
                    ),
                }));
            }
            write_record(conn, &change.record)?;
            if let Some(entry) = &change.log_entry {
                insert_log_entry(conn, entry)?;
            }
            Ok(Some(change.record))
        })
    }

    fn query_schedule_records(&self, filter: &RecordFilter) -> Result<Vec<ScheduledItem>> {
        let mut sql = String::from(
            "SELECT i.id, i.subject_id, i.category_id, i.created_at,
                    r.item_id, r.box_number, r.next_review_date, r.last_reviewed_at,
                    r.correct_count, r.incorrect_count
             FROM schedule_records r
             JOIN items i ON i.id = r.item_id
             WHERE 1 = 1",
        );
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(date) = filter.due_on_or_before {
            values.push(Box::new(format_date(date)));
            sql.push_str(&format!(" AND r.next_review_date <= ?{}", values.len()));
        }
        if let Some(subject_id) = &filter.subject_id {
            values.push(Box::new(subject_id.clone()));
            sql.push_str(&format!(" AND i.subject_id = ?{}", values.len()));
        }
        if let Some(category_id) = &filter.category_id {
            values.push(Box::new(category_id.clone()));
            sql.push_str(&format!(" AND i.category_id = ?{}", values.len()));
        }
        if let Some(box_number) = filter.box_number {
            values.push(Box::new(box_number));
            sql.push_str(&format!(" AND r.box_number = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY i.created_at, i.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((RawItem::from_row(row)?, RawRecord::from_row(row, 4)?))
        })?;

        let mut scheduled = Vec::new();
        for row in rows {
            let (item, record) = row?;
            scheduled.push(ScheduledItem {
                item: item.decode()?,
                record: record.decode()?,
            });
        }
        Ok(scheduled)
    }

    fn query_review_log(&self, filter: &ReviewLogFilter) -> Result<Vec<ReviewLogEntry>> {
        let mut sql = String::from(
            "SELECT l.item_id, l.subject_id, l.occurred_at, l.was_correct, l.time_spent_seconds
             FROM review_log l",
        );
        if filter.category_id.is_some() {
            sql.push_str(" JOIN items i ON i.id = l.item_id");
        }
        sql.push_str(" WHERE 1 = 1");
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(subject_id) = &filter.subject_id {
            values.push(Box::new(subject_id.clone()));
            sql.push_str(&format!(" AND l.subject_id = ?{}", values.len()));
        }
        if let Some(item_id) = &filter.item_id {
            values.push(Box::new(item_id.clone()));
            sql.push_str(&format!(" AND l.item_id = ?{}", values.len()));
        }
        if let Some(category_id) = &filter.category_id {
            values.push(Box::new(category_id.clone()));
            sql.push_str(&format!(" AND i.category_id = ?{}", values.len()));
        }
        if let Some(since) = filter.since {
            values.push(Box::new(day_start(since)));
            sql.push_str(&format!(" AND l.occurred_at >= ?{}", values.len()));
        }
        if let Some(until) = filter.until {
            let end = until.succ_opt().map(day_start);
            if let Some(end) = end {
                values.push(Box::new(end));
                sql.push_str(&format!(" AND l.occurred_at < ?{}", values.len()));
            }
        }
        sql.push_str(" ORDER BY l.occurred_at, l.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(params.as_slice(), RawLogEntry::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.decode()?);
        }
        Ok(entries)
    }

    fn list_distinct_review_dates(&self, subject_id: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(occurred_at, 1, 10) AS day
             FROM review_log
             WHERE subject_id = ?1
             ORDER BY day DESC",
        )?;
        let rows = stmt.query_map(params![subject_id], |row| row.get::<_, String>(0))?;

        let mut dates = Vec::new();
        for row in rows {
            dates.push(parse_date(&row?)?);
        }
        Ok(dates)
    }
}

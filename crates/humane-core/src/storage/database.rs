//! SQLite-backed habit and entry storage.
//!
//! Provides persistent storage for:
//! - Habit definitions, partitioned by user id
//! - Daily entries, at most one per habit and day
//!
//! A single [`SqliteStore`] implements both [`HabitStore`] and [`EntryStore`].
//! When constructed with a [`ChangeFeed`] every mutation is published to it.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::migrations;
use super::store::{EntryStore, HabitStore};
use super::data_dir;
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::events::{ChangeFeed, StoreChange};
use crate::habit::{validate_entry_value, Category, Entry, Habit, HabitPatch, NewEntry, NewHabit};

const DAY_FORMAT: &str = "%Y-%m-%d";

const HABIT_COLUMNS: &str =
    "id, user_id, name, category, target_per_week, creation_nonce, parent_id, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, habit_id, user_id, date, value, created_at";

/// Habit row as stored, before decoding enums and timestamps.
struct HabitRow {
    id: String,
    user_id: String,
    name: String,
    category: String,
    target_per_week: i64,
    creation_nonce: Option<String>,
    parent_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl HabitRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            target_per_week: row.get(4)?,
            creation_nonce: row.get(5)?,
            parent_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<Habit> {
        let category: Category = self
            .category
            .parse()
            .map_err(|_| corrupt("habits", format!("unknown category '{}'", self.category)))?;
        let target_per_week = u8::try_from(self.target_per_week)
            .map_err(|_| corrupt("habits", format!("bad target {}", self.target_per_week)))?;
        Ok(Habit {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            category,
            target_per_week,
            creation_nonce: self.creation_nonce,
            parent_id: self.parent_id,
            created_at: parse_timestamp("habits", &self.created_at)?,
            updated_at: parse_timestamp("habits", &self.updated_at)?,
        })
    }
}

struct EntryRow {
    id: String,
    habit_id: String,
    user_id: String,
    date: String,
    value: f64,
    created_at: String,
}

impl EntryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            user_id: row.get(2)?,
            date: row.get(3)?,
            value: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<Entry> {
        let date = NaiveDate::parse_from_str(&self.date, DAY_FORMAT)
            .map_err(|e| corrupt("entries", format!("bad date '{}': {e}", self.date)))?;
        Ok(Entry {
            id: self.id,
            habit_id: self.habit_id,
            user_id: self.user_id,
            date,
            value: self.value,
            created_at: parse_timestamp("entries", &self.created_at)?,
        })
    }
}

fn corrupt(table: &'static str, message: String) -> CoreError {
    CoreError::Store(StoreError::Corrupt { table, message })
}

fn parse_timestamp(table: &'static str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(table, format!("bad timestamp '{s}': {e}")))
}

fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// SQLite database holding habits and entries.
pub struct SqliteStore {
    conn: Connection,
    feed: Option<ChangeFeed>,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/humane.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unusable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("humane.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, feed: None })
    }

    /// Publish every mutation to `feed`.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    fn notify(&self, change: StoreChange) {
        if let Some(feed) = &self.feed {
            feed.publish(change);
        }
    }

    /// Run `op` inside `BEGIN IMMEDIATE`, committing on success.
    fn in_transaction<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match op() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    /// Delete a habit and all its entries in one transaction.
    pub fn delete_habit_with_entries(&self, habit_id: &str) -> Result<usize> {
        let removed = self.in_transaction(|| {
            let removed = self
                .conn
                .execute("DELETE FROM entries WHERE habit_id = ?1", params![habit_id])?;
            let deleted = self
                .conn
                .execute("DELETE FROM habits WHERE id = ?1", params![habit_id])?;
            if deleted == 0 {
                return Err(CoreError::habit_not_found(habit_id));
            }
            Ok(removed)
        });
        if removed.is_ok() {
            tracing::debug!(habit_id, "deleted habit with entries");
        }
        removed
    }

    /// Every entry of a user regardless of date, oldest first.
    pub fn all_entries_for_user(&self, user_id: &str) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = ?1 ORDER BY date, id"),
            params![user_id],
        )
    }

    fn query_habits(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, HabitRow::read)?;
        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?.decode()?);
        }
        Ok(habits)
    }

    fn query_entries(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, EntryRow::read)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.decode()?);
        }
        Ok(entries)
    }

    fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                params![id],
                EntryRow::read,
            )
            .optional()?;
        row.map(EntryRow::decode).transpose()
    }
}

impl HabitStore for SqliteStore {
    fn create(&self, habit: NewHabit) -> Result<String> {
        habit.validate()?;
        if let Some(nonce) = habit.creation_nonce.as_deref() {
            if let Some(existing) = self.find_by_nonce(&habit.user_id, nonce)? {
                tracing::debug!(habit_id = %existing.id, nonce, "create replayed, returning existing habit");
                return Ok(existing.id);
            }
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO habits (id, user_id, name, category, target_per_week, creation_nonce, parent_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                habit.user_id,
                habit.name,
                habit.category.as_str(),
                habit.target_per_week,
                habit.creation_nonce,
                habit.parent_id,
                now,
            ],
        )?;
        self.notify(StoreChange::HabitCreated {
            user_id: habit.user_id,
            habit_id: id.clone(),
        });
        Ok(id)
    }

    fn update(&self, id: &str, patch: &HabitPatch) -> Result<()> {
        patch.validate()?;
        let mut habit = self.get(id)?.ok_or_else(|| CoreError::habit_not_found(id))?;
        if patch.is_empty() {
            return Ok(());
        }
        patch.apply(&mut habit, Utc::now());
        self.conn.execute(
            "UPDATE habits SET name = ?1, category = ?2, target_per_week = ?3, parent_id = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                habit.name,
                habit.category.as_str(),
                habit.target_per_week,
                habit.parent_id,
                habit.updated_at.to_rfc3339(),
                id,
            ],
        )?;
        self.notify(StoreChange::HabitUpdated {
            user_id: habit.user_id,
            habit_id: habit.id,
        });
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let user_id: Option<String> = self
            .conn
            .query_row("SELECT user_id FROM habits WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        let user_id = user_id.ok_or_else(|| CoreError::habit_not_found(id))?;
        self.conn.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        self.notify(StoreChange::HabitDeleted {
            user_id,
            habit_id: id.to_string(),
        });
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Habit>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                HabitRow::read,
            )
            .optional()?;
        row.map(HabitRow::decode).transpose()
    }

    fn get_by_user_id(&self, user_id: &str) -> Result<Vec<Habit>> {
        self.query_habits(
            &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1 ORDER BY created_at, rowid"),
            params![user_id],
        )
    }

    fn find_by_nonce(&self, user_id: &str, nonce: &str) -> Result<Option<Habit>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1 AND creation_nonce = ?2"),
                params![user_id, nonce],
                HabitRow::read,
            )
            .optional()?;
        row.map(HabitRow::decode).transpose()
    }

    fn delete_by_user_id(&self, user_id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM habits WHERE user_id = ?1", params![user_id])?;
        if deleted > 0 {
            self.notify(StoreChange::PartitionCleared {
                user_id: user_id.to_string(),
                habits: deleted,
                entries: 0,
            });
        }
        Ok(deleted)
    }

    fn count_by_user_id(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl EntryStore for SqliteStore {
    fn add(&self, entry: NewEntry) -> Result<String> {
        entry.validate()?;
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM habits WHERE id = ?1",
                params![entry.habit_id],
                |row| row.get(0),
            )
            .optional()?;
        let owner = owner.ok_or_else(|| CoreError::habit_not_found(&entry.habit_id))?;
        if owner != entry.user_id {
            return Err(ValidationError::InvalidValue {
                field: "user_id".into(),
                message: format!("habit {} belongs to another user", entry.habit_id),
            }
            .into());
        }
        if self.find_by_habit_and_date(&entry.habit_id, entry.date)?.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!("habit {} already has an entry on {}", entry.habit_id, entry.date),
            }
            .into());
        }

        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO entries (id, habit_id, user_id, date, value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                entry.habit_id,
                entry.user_id,
                format_day(entry.date),
                entry.value,
                Utc::now().to_rfc3339(),
            ],
        )?;
        self.notify(StoreChange::EntryWritten {
            user_id: entry.user_id,
            habit_id: entry.habit_id,
            date: entry.date,
        });
        Ok(id)
    }

    fn update_value(&self, id: &str, value: f64) -> Result<()> {
        validate_entry_value(value)?;
        let entry = self.get_entry(id)?.ok_or_else(|| CoreError::entry_not_found(id))?;
        self.conn.execute(
            "UPDATE entries SET value = ?1 WHERE id = ?2",
            params![value, id],
        )?;
        self.notify(StoreChange::EntryWritten {
            user_id: entry.user_id,
            habit_id: entry.habit_id,
            date: entry.date,
        });
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let entry = self.get_entry(id)?.ok_or_else(|| CoreError::entry_not_found(id))?;
        self.conn.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        self.notify(StoreChange::EntryDeleted {
            user_id: entry.user_id,
            habit_id: entry.habit_id,
            date: entry.date,
        });
        Ok(())
    }

    fn find_by_habit_and_date(&self, habit_id: &str, date: NaiveDate) -> Result<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE habit_id = ?1 AND date = ?2"),
                params![habit_id, format_day(date)],
                EntryRow::read,
            )
            .optional()?;
        row.map(EntryRow::decode).transpose()
    }

    fn get_by_habit_and_date_range(
        &self,
        habit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries
                 WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date"
            ),
            params![habit_id, format_day(start), format_day(end)],
        )
    }

    fn get_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries
                 WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date, habit_id"
            ),
            params![user_id, format_day(start), format_day(end)],
        )
    }

    fn delete_by_user_id(&self, user_id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE user_id = ?1", params![user_id])?;
        if deleted > 0 {
            self.notify(StoreChange::PartitionCleared {
                user_id: user_id.to_string(),
                habits: 0,
                entries: deleted,
            });
        }
        Ok(deleted)
    }

    fn delete_by_habit_id(&self, habit_id: &str) -> Result<usize> {
        let user_id: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM entries WHERE habit_id = ?1 LIMIT 1",
                params![habit_id],
                |row| row.get(0),
            )
            .optional()?;
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE habit_id = ?1", params![habit_id])?;
        if let Some(user_id) = user_id {
            self.notify(StoreChange::PartitionCleared {
                user_id,
                habits: 0,
                entries: deleted,
            });
        }
        Ok(deleted)
    }

    fn count_by_user_id(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn serialized(&self, op: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        self.in_transaction(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn store_with_habit() -> (SqliteStore, String) {
        let store = SqliteStore::open_memory().unwrap();
        let id = HabitStore::create(&store, NewHabit::new("u", "Walk", Category::Mobility, 3)).unwrap();
        (store, id)
    }

    #[test]
    fn create_and_get_habit() {
        let (store, id) = store_with_habit();
        let habit = HabitStore::get(&store, &id).unwrap().unwrap();
        assert_eq!(habit.name, "Walk");
        assert_eq!(habit.category, Category::Mobility);
        assert_eq!(habit.target_per_week, 3);
        assert_eq!(HabitStore::count_by_user_id(&store, "u").unwrap(), 1);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let store = SqliteStore::open_memory().unwrap();
        let err = HabitStore::create(&store, NewHabit::new("", "Walk", Category::Joy, 3)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Empty("user_id"))));
    }

    #[test]
    fn create_with_same_nonce_is_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let new = NewHabit::new("u", "Walk", Category::Mobility, 3).with_nonce("n-1");
        let first = HabitStore::create(&store, new.clone()).unwrap();
        let second = HabitStore::create(&store, new).unwrap();
        assert_eq!(first, second);
        assert_eq!(HabitStore::count_by_user_id(&store, "u").unwrap(), 1);
    }

    #[test]
    fn same_nonce_for_different_users_creates_two() {
        let store = SqliteStore::open_memory().unwrap();
        let a = HabitStore::create(&store, NewHabit::new("a", "Walk", Category::Mobility, 3).with_nonce("n")).unwrap();
        let b = HabitStore::create(&store, NewHabit::new("b", "Walk", Category::Mobility, 3).with_nonce("n")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn update_missing_habit_is_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        let patch = HabitPatch {
            name: Some("x".into()),
            ..Default::default()
        };
        let err = HabitStore::update(&store, "nope", &patch).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "Habit", .. }));
    }

    #[test]
    fn update_changes_fields() {
        let (store, id) = store_with_habit();
        let patch = HabitPatch {
            name: Some("Long walk".into()),
            category: Some(Category::Balance),
            target_per_week: Some(4),
            parent_id: None,
        };
        HabitStore::update(&store, &id, &patch).unwrap();
        let habit = HabitStore::get(&store, &id).unwrap().unwrap();
        assert_eq!(habit.name, "Long walk");
        assert_eq!(habit.category, Category::Balance);
        assert_eq!(habit.target_per_week, 4);
    }

    #[test]
    fn deleting_habit_leaves_entries() {
        let (store, id) = store_with_habit();
        store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        HabitStore::delete(&store, &id).unwrap();
        assert_eq!(EntryStore::count_by_user_id(&store, "u").unwrap(), 1);
        assert_eq!(store.delete_by_habit_id(&id).unwrap(), 1);
    }

    #[test]
    fn delete_habit_with_entries_removes_both() {
        let (store, id) = store_with_habit();
        store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        store.add(NewEntry::new(&id, "u", day(25), 2.0)).unwrap();
        assert_eq!(store.delete_habit_with_entries(&id).unwrap(), 2);
        assert_eq!(EntryStore::count_by_user_id(&store, "u").unwrap(), 0);
        assert_eq!(HabitStore::count_by_user_id(&store, "u").unwrap(), 0);
    }

    #[test]
    fn delete_habit_with_entries_rolls_back_when_missing() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.delete_habit_with_entries("ghost").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        // connection is usable again after rollback
        assert_eq!(HabitStore::count_by_user_id(&store, "u").unwrap(), 0);
    }

    #[test]
    fn add_enforces_one_entry_per_day() {
        let (store, id) = store_with_habit();
        store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        let err = store.add(NewEntry::new(&id, "u", day(24), 2.0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn add_requires_existing_habit_of_same_user() {
        let (store, id) = store_with_habit();
        let err = store.add(NewEntry::new("ghost", "u", day(24), 1.0)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        let err = store.add(NewEntry::new(&id, "other", day(24), 1.0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn add_rejects_zero_value() {
        let (store, id) = store_with_habit();
        let err = store.add(NewEntry::new(&id, "u", day(24), 0.0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidEntryValue(_))));
    }

    #[test]
    fn update_value_and_delete_entry() {
        let (store, id) = store_with_habit();
        let entry_id = store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        store.update_value(&entry_id, 0.5).unwrap();
        let entry = store.find_by_habit_and_date(&id, day(24)).unwrap().unwrap();
        assert_eq!(entry.value, 0.5);
        EntryStore::delete(&store, &entry_id).unwrap();
        assert!(store.find_by_habit_and_date(&id, day(24)).unwrap().is_none());
        assert!(matches!(
            EntryStore::delete(&store, &entry_id).unwrap_err(),
            CoreError::NotFound { kind: "Entry", .. }
        ));
    }

    #[test]
    fn date_ranges_are_inclusive() {
        let (store, id) = store_with_habit();
        for d in [23, 24, 27, 30] {
            store.add(NewEntry::new(&id, "u", day(d), 1.0)).unwrap();
        }
        let by_habit = store.get_by_habit_and_date_range(&id, day(24), day(30)).unwrap();
        assert_eq!(by_habit.iter().map(|e| e.date).collect::<Vec<_>>(), vec![day(24), day(27), day(30)]);
        let by_user = store.get_by_user_and_date_range("u", day(24), day(27)).unwrap();
        assert_eq!(by_user.len(), 2);
        assert!(store.get_by_user_and_date_range("other", day(1), day(30)).unwrap().is_empty());
    }

    #[test]
    fn partition_deletes_only_touch_one_user() {
        let (store, id) = store_with_habit();
        let other = HabitStore::create(&store, NewHabit::new("v", "Read", Category::Joy, 2)).unwrap();
        store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        store.add(NewEntry::new(&other, "v", day(24), 1.0)).unwrap();

        assert_eq!(EntryStore::delete_by_user_id(&store, "u").unwrap(), 1);
        assert_eq!(HabitStore::delete_by_user_id(&store, "u").unwrap(), 1);
        assert_eq!(EntryStore::count_by_user_id(&store, "v").unwrap(), 1);
        assert_eq!(HabitStore::count_by_user_id(&store, "v").unwrap(), 1);
    }

    #[test]
    fn mutations_are_published() {
        let feed = ChangeFeed::new(16);
        let mut sub = feed.subscribe_user("u");
        let store = SqliteStore::open_memory().unwrap().with_feed(feed);
        assert!(!sub.drain());
        let id = HabitStore::create(&store, NewHabit::new("u", "Walk", Category::Mobility, 3)).unwrap();
        assert!(sub.drain());
        store.add(NewEntry::new(&id, "u", day(24), 1.0)).unwrap();
        assert!(sub.drain());
    }

    #[test]
    fn serialized_rolls_back_on_error() {
        let (store, id) = store_with_habit();
        let result = store.serialized(&mut || {
            store.add(NewEntry::new(&id, "u", day(24), 1.0))?;
            Err(CoreError::Reconciliation("boom".into()))
        });
        assert!(result.is_err());
        assert!(store.find_by_habit_and_date(&id, day(24)).unwrap().is_none());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("humane.db");
        {
            let store = SqliteStore::open_at(&path).unwrap();
            HabitStore::create(&store, NewHabit::new("u", "Walk", Category::Mobility, 3)).unwrap();
        }
        let store = SqliteStore::open_at(&path).unwrap();
        assert_eq!(HabitStore::count_by_user_id(&store, "u").unwrap(), 1);
    }
}

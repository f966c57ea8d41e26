//! JSON backup documents.
//!
//! A backup is `{ "version", "habits": [...], "entries": [...] }` with
//! camelCase keys. Documents written by other tools may carry keys this
//! module does not know about; they are kept and written back unchanged.
//!
//! Backups are inspected and repaired offline (listing, merging duplicate
//! habits) and moved in and out of the stores with [`export`] and
//! [`import`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{CoreError, Result, ValidationError};
use crate::habit::{
    parse_day, validate_user_id, Category, Habit, NewEntry, NewHabit, MAX_ENTRY_VALUE,
};
use crate::storage::{EntryStore, HabitStore};

pub const BACKUP_VERSION: u32 = 1;

/// Category reported for habits without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Name reported for habit ids missing from the document.
pub const UNKNOWN_HABIT: &str = "Unknown";

const EARLIEST_DAY: (i32, u32, u32) = (1, 1, 1);
const LATEST_DAY: (i32, u32, u32) = (9999, 12, 31);

fn default_version() -> u32 {
    BACKUP_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupHabit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Raw category. Older backups use names outside [`Category`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_per_week: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackupHabit {
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    #[serde(default)]
    pub id: String,
    /// Empty when the record names no habit; such entries are skipped.
    #[serde(default)]
    pub habit_id: String,
    /// `YYYY-MM-DD`, possibly followed by a time part.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackupEntry {
    /// Calendar-day part of `date`.
    pub fn day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }
}

/// Per-category totals reported by [`BackupDocument::category_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub habit_count: usize,
    pub total_target: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub habits: Vec<BackupHabit>,
    #[serde(default)]
    pub entries: Vec<BackupEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BackupDocument {
    fn default() -> Self {
        Self {
            version: BACKUP_VERSION,
            habits: Vec::new(),
            entries: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl BackupDocument {
    /// Read a backup file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a backup.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn habit(&self, id: &str) -> Option<&BackupHabit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// Habits grouped by category, missing categories as `"uncategorized"`.
    pub fn categories(&self) -> BTreeMap<String, Vec<&BackupHabit>> {
        let mut groups: BTreeMap<String, Vec<&BackupHabit>> = BTreeMap::new();
        for habit in &self.habits {
            groups
                .entry(habit.category_or_default().to_string())
                .or_default()
                .push(habit);
        }
        groups
    }

    pub fn habits_in_category(&self, category: &str) -> Vec<&BackupHabit> {
        self.habits
            .iter()
            .filter(|h| h.category.as_deref() == Some(category))
            .collect()
    }

    pub fn entries_for_habit(&self, habit_id: &str) -> Vec<&BackupEntry> {
        self.entries.iter().filter(|e| e.habit_id == habit_id).collect()
    }

    pub fn habit_name(&self, habit_id: &str) -> &str {
        self.habit(habit_id)
            .map(|h| h.name.as_str())
            .unwrap_or(UNKNOWN_HABIT)
    }

    /// Habit count and summed weekly target per category, sorted by name.
    pub fn category_stats(&self) -> Vec<CategoryStat> {
        self.categories()
            .into_iter()
            .map(|(category, habits)| CategoryStat {
                habit_count: habits.len(),
                total_target: habits.iter().map(|h| h.target_per_week.unwrap_or(0)).sum(),
                category,
            })
            .collect()
    }

    /// Habits whose name contains `pattern`, ignoring case.
    pub fn find_habits_by_name(&self, pattern: &str) -> Vec<&BackupHabit> {
        let pattern = pattern.to_lowercase();
        self.habits
            .iter()
            .filter(|h| h.name.to_lowercase().contains(&pattern))
            .collect()
    }

    /// Fold `sources` into `target` and return the rewritten document.
    ///
    /// Entries of the merged habits are grouped by calendar day and the
    /// highest value of each day is kept under the target id. Source habits
    /// are removed; every other habit and entry is left as it was. Listing
    /// the target among the sources is harmless.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] if `target` is not in the document.
    pub fn merge_habits(&self, target: &str, sources: &[&str]) -> Result<BackupDocument> {
        if self.habit(target).is_none() {
            return Err(CoreError::habit_not_found(target));
        }
        let sources: HashSet<&str> = sources.iter().copied().filter(|s| *s != target).collect();
        let merged = |habit_id: &str| habit_id == target || sources.contains(habit_id);

        let mut days: Vec<(String, &BackupEntry)> = Vec::new();
        let mut slot_of: HashMap<&str, usize> = HashMap::new();
        let mut untouched = Vec::new();

        for entry in &self.entries {
            if !merged(&entry.habit_id) {
                untouched.push(entry.clone());
                continue;
            }
            match slot_of.get(entry.day()).copied() {
                Some(slot) => {
                    if entry.value > days[slot].1.value {
                        days[slot].1 = entry;
                    }
                }
                None => {
                    slot_of.insert(entry.day(), days.len());
                    days.push((entry.day().to_string(), entry));
                }
            }
        }

        let folded = days.into_iter().map(|(day, best)| BackupEntry {
            habit_id: target.to_string(),
            date: day,
            ..best.clone()
        });
        let entries: Vec<BackupEntry> = untouched.into_iter().chain(folded).collect();

        tracing::info!(
            into = target,
            sources = sources.len(),
            entries = entries.len(),
            "merged backup habits"
        );

        Ok(BackupDocument {
            version: self.version,
            habits: self
                .habits
                .iter()
                .filter(|h| !sources.contains(h.id.as_str()))
                .cloned()
                .collect(),
            entries,
            extra: self.extra.clone(),
        })
    }
}

fn day(ymd: (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
}

fn habit_record(habit: &Habit) -> BackupHabit {
    let mut extra = Map::new();
    extra.insert("userId".into(), json!(habit.user_id));
    extra.insert("createdAt".into(), json!(habit.created_at.to_rfc3339()));
    extra.insert("updatedAt".into(), json!(habit.updated_at.to_rfc3339()));
    if let Some(parent) = &habit.parent_id {
        extra.insert("parentId".into(), json!(parent));
    }
    BackupHabit {
        id: habit.id.clone(),
        name: habit.name.clone(),
        category: Some(habit.category.as_str().to_string()),
        target_per_week: Some(i64::from(habit.target_per_week)),
        extra,
    }
}

/// Snapshot every habit and entry of `user_id` as a backup document.
pub fn export(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
) -> Result<BackupDocument> {
    validate_user_id(user_id)?;
    let (Some(earliest), Some(latest)) = (day(EARLIEST_DAY), day(LATEST_DAY)) else {
        return Err(ValidationError::InvalidDate("9999-12-31".into()).into());
    };

    let mut doc = BackupDocument::default();
    for habit in habits.get_by_user_id(user_id)? {
        for entry in entries.get_by_habit_and_date_range(&habit.id, earliest, latest)? {
            let mut extra = Map::new();
            extra.insert("userId".into(), json!(entry.user_id));
            doc.entries.push(BackupEntry {
                id: entry.id,
                habit_id: entry.habit_id,
                date: entry.date.format("%Y-%m-%d").to_string(),
                value: entry.value,
                created_at: Some(entry.created_at.to_rfc3339()),
                extra,
            });
        }
        doc.habits.push(habit_record(&habit));
    }

    tracing::info!(
        user_id,
        habits = doc.habits.len(),
        entries = doc.entries.len(),
        "exported backup"
    );
    Ok(doc)
}

/// Counts reported by [`import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub habits_created: usize,
    /// Habits already present from an earlier import of the same document.
    pub habits_existing: usize,
    pub habits_skipped: usize,
    pub entries_written: usize,
    pub entries_skipped: usize,
}

fn backup_nonce(backup_id: &str) -> String {
    format!("backup:{backup_id}")
}

fn import_habit(record: &BackupHabit, user_id: &str) -> Result<NewHabit> {
    let category: Category = record.category_or_default().parse()?;
    let target = record
        .target_per_week
        .and_then(|t| u8::try_from(t).ok())
        .unwrap_or(0);
    let new = NewHabit::new(user_id, &record.name, category, target)
        .with_nonce(backup_nonce(&record.id));
    new.validate()?;
    Ok(new)
}

/// Load a backup document into the stores under `user_id`.
///
/// Habits are created with a nonce derived from their backup id, so
/// importing the same document twice creates nothing new. Records that do
/// not fit the data model (unknown category, target outside 1..=7,
/// unparseable day, non-positive value) are skipped. Several entries for
/// one habit and day collapse to the highest value, capped at 5, and an
/// existing entry is only ever raised.
///
/// # Errors
/// Store failures abort the import; records written before the failure
/// stay written.
pub fn import(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
    doc: &BackupDocument,
) -> Result<ImportReport> {
    validate_user_id(user_id)?;
    let mut report = ImportReport::default();
    let mut ids: HashMap<&str, String> = HashMap::new();

    for record in &doc.habits {
        match import_habit(record, user_id) {
            Ok(new) => {
                let id = match habits.find_by_nonce(user_id, &backup_nonce(&record.id))? {
                    Some(existing) => {
                        report.habits_existing += 1;
                        existing.id
                    }
                    None => {
                        report.habits_created += 1;
                        habits.create(new)?
                    }
                };
                ids.insert(record.id.as_str(), id);
            }
            Err(e) => {
                tracing::warn!(habit = %record.id, error = %e, "skipping backup habit");
                report.habits_skipped += 1;
            }
        }
    }

    let mut best: BTreeMap<(&str, NaiveDate), f64> = BTreeMap::new();
    for record in &doc.entries {
        let Some(habit_id) = ids.get(record.habit_id.as_str()) else {
            report.entries_skipped += 1;
            continue;
        };
        let date = match parse_day(&record.date) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(entry = %record.id, error = %e, "skipping backup entry");
                report.entries_skipped += 1;
                continue;
            }
        };
        if !record.value.is_finite() || record.value <= 0.0 {
            report.entries_skipped += 1;
            continue;
        }
        let value = record.value.min(MAX_ENTRY_VALUE);
        let slot = best.entry((habit_id.as_str(), date)).or_insert(value);
        if value > *slot {
            *slot = value;
        }
    }

    for ((habit_id, date), value) in best {
        match entries.find_by_habit_and_date(habit_id, date)? {
            None => {
                entries.add(NewEntry::new(habit_id, user_id, date, value))?;
                report.entries_written += 1;
            }
            Some(existing) if existing.value < value => {
                entries.update_value(&existing.id, value)?;
                report.entries_written += 1;
            }
            Some(_) => {}
        }
    }

    tracing::info!(user_id, ?report, "imported backup");
    Ok(report)
}

//! Store interfaces consumed by the core.
//!
//! The status engine, aggregation layer and sign-in protocol only ever see
//! these traits. [`SqliteStore`](super::SqliteStore) is the bundled
//! implementation; tests substitute their own.

use chrono::NaiveDate;

use crate::error::Result;
use crate::habit::{Entry, Habit, HabitPatch, NewEntry, NewHabit};

/// Durable per-user collection of habit definitions.
pub trait HabitStore {
    /// Create a habit and return its id.
    ///
    /// When `habit.creation_nonce` matches an existing habit of the same
    /// user, the existing id is returned and nothing is inserted.
    fn create(&self, habit: NewHabit) -> Result<String>;

    fn update(&self, id: &str, patch: &HabitPatch) -> Result<()>;

    /// Delete one habit. Its entries are left in place.
    fn delete(&self, id: &str) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Habit>>;

    /// All habits of a user, oldest first.
    fn get_by_user_id(&self, user_id: &str) -> Result<Vec<Habit>>;

    fn find_by_nonce(&self, user_id: &str, nonce: &str) -> Result<Option<Habit>>;

    fn delete_by_user_id(&self, user_id: &str) -> Result<usize>;

    fn count_by_user_id(&self, user_id: &str) -> Result<usize>;
}

/// Durable per-user collection of dated habit entries.
///
/// Date ranges are inclusive on both ends.
pub trait EntryStore {
    /// Record an entry and return its id.
    fn add(&self, entry: NewEntry) -> Result<String>;

    fn update_value(&self, id: &str, value: f64) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    fn find_by_habit_and_date(&self, habit_id: &str, date: NaiveDate) -> Result<Option<Entry>>;

    fn get_by_habit_and_date_range(
        &self,
        habit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>>;

    fn get_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>>;

    fn delete_by_user_id(&self, user_id: &str) -> Result<usize>;

    fn delete_by_habit_id(&self, habit_id: &str) -> Result<usize>;

    fn count_by_user_id(&self, user_id: &str) -> Result<usize>;

    /// Run a read-then-write sequence without interleaving other writers.
    ///
    /// Stores without a locking primitive run `op` directly, which leaves
    /// racing writers on last-write-wins terms.
    fn serialized(&self, op: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        op()
    }
}

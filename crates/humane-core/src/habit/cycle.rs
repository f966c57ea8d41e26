//! Click-to-cycle for a single (habit, day) cell.
//!
//! Each activation moves the cell one step around
//! `none -> 1 -> 2 -> 3 -> 4 -> 5 -> 0.5 -> none`. Cells older than
//! yesterday, or in the future, only change after the caller confirms.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{validate_user_id, NewEntry, MAX_ENTRY_VALUE, PARTIAL_VALUE};
use crate::error::{Result, ValidationError};
use crate::storage::EntryStore;

/// Next value of a cell. `None` is "no entry".
///
/// Zero is the same as no entry. A value with no room for another step
/// wraps to `0.5`, and fractions below one other than `0.5` clear the cell.
pub fn next_value(current: Option<f64>) -> Option<f64> {
    match current {
        None => Some(1.0),
        Some(v) if v.is_nan() || v <= 0.0 => Some(1.0),
        Some(v) if v == PARTIAL_VALUE => None,
        Some(v) if v + 1.0 > MAX_ENTRY_VALUE => Some(PARTIAL_VALUE),
        Some(v) if v >= 1.0 => Some(v + 1.0),
        Some(_) => None,
    }
}

/// Whether editing `date` needs an explicit yes/no first.
pub fn needs_confirmation(date: NaiveDate, today: NaiveDate) -> bool {
    date != today && date != today - Duration::days(1)
}

/// One cell activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRequest {
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub today: NaiveDate,
}

impl CycleRequest {
    pub fn new(
        habit_id: impl Into<String>,
        user_id: impl Into<String>,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        Self {
            habit_id: habit_id.into(),
            user_id: user_id.into(),
            date,
            today,
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        needs_confirmation(self.date, self.today)
    }
}

/// What a cell activation did to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Created { entry_id: String, value: f64 },
    Updated { entry_id: String, from: f64, to: f64 },
    Deleted { entry_id: String, from: f64 },
    /// The historical-edit confirmation was declined; nothing changed.
    Declined,
}

impl CycleOutcome {
    /// Cell value after the activation, `None` when the cell is empty or
    /// was left untouched.
    pub fn value(&self) -> Option<f64> {
        match self {
            CycleOutcome::Created { value, .. } => Some(*value),
            CycleOutcome::Updated { to, .. } => Some(*to),
            CycleOutcome::Deleted { .. } | CycleOutcome::Declined => None,
        }
    }
}

/// Apply one activation of a cell against the entry store.
///
/// `confirm` is only consulted for dates that are neither today nor
/// yesterday; returning `false` leaves the store untouched. The existing
/// entry is read before the new value is written, inside
/// [`EntryStore::serialized`].
pub fn cycle_cell(
    entries: &dyn EntryStore,
    request: &CycleRequest,
    confirm: impl FnOnce(&CycleRequest) -> bool,
) -> Result<CycleOutcome> {
    validate_user_id(&request.user_id)?;
    if request.habit_id.trim().is_empty() {
        return Err(ValidationError::Empty("habit_id").into());
    }

    if request.needs_confirmation() && !confirm(request) {
        tracing::debug!(habit_id = %request.habit_id, date = %request.date, "historical edit declined");
        return Ok(CycleOutcome::Declined);
    }

    let mut outcome = None;
    entries.serialized(&mut || {
        let existing = entries.find_by_habit_and_date(&request.habit_id, request.date)?;
        let next = next_value(existing.as_ref().map(|e| e.value));
        let result = match (existing, next) {
            (None, Some(value)) => {
                let entry_id = entries.add(NewEntry::new(
                    &request.habit_id,
                    &request.user_id,
                    request.date,
                    value,
                ))?;
                CycleOutcome::Created { entry_id, value }
            }
            (Some(entry), Some(to)) => {
                entries.update_value(&entry.id, to)?;
                CycleOutcome::Updated {
                    entry_id: entry.id,
                    from: entry.value,
                    to,
                }
            }
            (Some(entry), None) => {
                entries.delete(&entry.id)?;
                CycleOutcome::Deleted {
                    entry_id: entry.id,
                    from: entry.value,
                }
            }
            // next_value(None) is always Some
            (None, None) => CycleOutcome::Declined,
        };
        outcome = Some(result);
        Ok(())
    })?;

    let outcome = outcome.unwrap_or(CycleOutcome::Declined);
    tracing::debug!(habit_id = %request.habit_id, date = %request.date, ?outcome, "cell cycled");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{Category, NewHabit};
    use crate::storage::{HabitStore, SqliteStore};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn full_cycle_has_period_seven() {
        let mut v = None;
        let mut seen = Vec::new();
        for _ in 0..7 {
            v = next_value(v);
            seen.push(v);
        }
        assert_eq!(
            seen,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(0.5), None]
        );
    }

    #[test]
    fn zero_behaves_like_no_entry() {
        assert_eq!(next_value(Some(0.0)), Some(1.0));
    }

    #[test]
    fn odd_values_are_handled() {
        assert_eq!(next_value(Some(7.0)), Some(0.5));
        assert_eq!(next_value(Some(0.25)), None);
        assert_eq!(next_value(Some(1.5)), Some(2.5));
        assert_eq!(next_value(Some(4.5)), Some(0.5));
        assert_eq!(next_value(Some(4.0)), Some(5.0));
    }

    #[test]
    fn today_and_yesterday_need_no_confirmation() {
        let today = day(26);
        assert!(!needs_confirmation(today, today));
        assert!(!needs_confirmation(day(25), today));
        assert!(needs_confirmation(day(24), today));
        assert!(needs_confirmation(day(27), today));
    }

    fn setup() -> (SqliteStore, String) {
        let store = SqliteStore::open_memory().unwrap();
        let id = store
            .create(NewHabit::new("u", "Walk", Category::Mobility, 3))
            .unwrap();
        (store, id)
    }

    #[test]
    fn cycling_walks_the_store_through_the_states() {
        let (store, id) = setup();
        let req = CycleRequest::new(&id, "u", day(26), day(26));

        let first = cycle_cell(&store, &req, |_| unreachable!()).unwrap();
        assert!(matches!(first, CycleOutcome::Created { value, .. } if value == 1.0));

        for expected in [2.0, 3.0, 4.0, 5.0, 0.5] {
            let out = cycle_cell(&store, &req, |_| unreachable!()).unwrap();
            assert_eq!(out.value(), Some(expected));
            let stored = store.find_by_habit_and_date(&id, day(26)).unwrap().unwrap();
            assert_eq!(stored.value, expected);
        }

        let last = cycle_cell(&store, &req, |_| unreachable!()).unwrap();
        assert!(matches!(last, CycleOutcome::Deleted { from, .. } if from == 0.5));
        assert!(store.find_by_habit_and_date(&id, day(26)).unwrap().is_none());
    }

    #[test]
    fn declined_confirmation_is_a_no_op() {
        let (store, id) = setup();
        let req = CycleRequest::new(&id, "u", day(20), day(26));
        let out = cycle_cell(&store, &req, |_| false).unwrap();
        assert_eq!(out, CycleOutcome::Declined);
        assert_eq!(EntryStore::count_by_user_id(&store, "u").unwrap(), 0);
        assert!(store.find_by_habit_and_date(&id, day(20)).unwrap().is_none());
    }

    #[test]
    fn accepted_confirmation_applies_transition() {
        let (store, id) = setup();
        let req = CycleRequest::new(&id, "u", day(20), day(26));
        let mut asked = false;
        let out = cycle_cell(&store, &req, |r| {
            asked = true;
            r.date == day(20)
        })
        .unwrap();
        assert!(asked);
        assert_eq!(out.value(), Some(1.0));
    }

    #[test]
    fn stored_fraction_near_max_wraps_then_clears() {
        let (store, id) = setup();
        store.add(NewEntry::new(&id, "u", day(26), 4.5)).unwrap();
        let req = CycleRequest::new(&id, "u", day(26), day(26));

        let out = cycle_cell(&store, &req, |_| unreachable!()).unwrap();
        assert_eq!(out.value(), Some(0.5));
        let cleared = cycle_cell(&store, &req, |_| unreachable!()).unwrap();
        assert!(matches!(cleared, CycleOutcome::Deleted { .. }));
        assert!(store.find_by_habit_and_date(&id, day(26)).unwrap().is_none());
    }

    #[test]
    fn empty_user_is_rejected() {
        let (store, id) = setup();
        let req = CycleRequest::new(&id, " ", day(26), day(26));
        assert!(cycle_cell(&store, &req, |_| true).is_err());
    }
}

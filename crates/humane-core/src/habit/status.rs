//! Weekly status engine.
//!
//! Pure functions that classify a habit for a reference date from the
//! entries recorded in the Monday-to-Sunday week containing that date.
//! Nothing here touches a store; callers fetch the window themselves.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Entry, Habit};

/// Derived classification of a habit for the current week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Completed today (an entry with value >= 1 on the reference date).
    Done,
    /// Weekly target already reached.
    Met,
    /// Must be done today to stay on target.
    Today,
    /// Must be done by tomorrow.
    Tomorrow,
    /// Will need doing on every remaining day, three or more days out.
    Soon,
    /// No days left to reach the target.
    Overdue,
    /// Nothing urgent.
    Pending,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Done => "done",
            Status::Met => "met",
            Status::Today => "today",
            Status::Tomorrow => "tomorrow",
            Status::Soon => "soon",
            Status::Overdue => "overdue",
            Status::Pending => "pending",
        }
    }

    /// Whether the habit needs attention before the week ends.
    pub fn is_due(self) -> bool {
        matches!(
            self,
            Status::Today | Status::Tomorrow | Status::Soon | Status::Overdue
        )
    }

    /// Status as shown by displays that have no distinct `soon` treatment.
    pub fn display_bucket(self) -> Status {
        match self {
            Status::Soon => Status::Pending,
            other => other,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A habit together with its derived weekly state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithStatus {
    pub habit: Habit,
    pub status: Status,
    pub current_week_count: u32,
    /// Entries inside the current week window.
    pub entries: Vec<Entry>,
}

/// Monday and Sunday of the week containing `reference`.
pub fn week_window(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(reference.weekday().num_days_from_monday());
    let monday = reference - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Days from `reference` through Sunday, both ends included.
pub fn days_left_in_week(reference: NaiveDate) -> u32 {
    7 - reference.weekday().num_days_from_monday()
}

/// Number of distinct days with a positive entry.
///
/// Two completions on the same day still count as one day.
pub fn compute_week_count(entries: &[Entry]) -> u32 {
    entries
        .iter()
        .filter(|e| e.is_positive())
        .map(|e| e.date)
        .collect::<BTreeSet<_>>()
        .len() as u32
}

/// Classify `habit` for `reference` from the entries of its week.
///
/// Entries outside the week containing `reference` are ignored.
pub fn compute_status(habit: &Habit, entries: &[Entry], reference: NaiveDate) -> Status {
    let (monday, sunday) = week_window(reference);
    let in_week: Vec<&Entry> = entries
        .iter()
        .filter(|e| e.date >= monday && e.date <= sunday)
        .collect();

    // A day may hold several entries; any complete one counts.
    if in_week.iter().any(|e| e.date == reference && e.is_complete()) {
        return Status::Done;
    }
    let logged_today = in_week.iter().any(|e| e.date == reference);

    let days_met = in_week
        .iter()
        .filter(|e| e.is_positive())
        .map(|e| e.date)
        .collect::<BTreeSet<_>>()
        .len() as u32;
    let target = u32::from(habit.target_per_week);
    if days_met >= target {
        return Status::Met;
    }

    let days_left = days_left_in_week(reference);
    let days_needed = target - days_met;
    if days_left <= days_needed && !logged_today {
        return urgency(days_left);
    }

    Status::Pending
}

fn urgency(days_left: u32) -> Status {
    match days_left {
        0 => Status::Overdue,
        1 => Status::Today,
        2 => Status::Tomorrow,
        _ => Status::Soon,
    }
}

/// Build the status view for one habit from any slice of its entries.
pub fn evaluate(habit: Habit, entries: &[Entry], reference: NaiveDate) -> HabitWithStatus {
    let (monday, sunday) = week_window(reference);
    let window: Vec<Entry> = entries
        .iter()
        .filter(|e| e.habit_id == habit.id && e.date >= monday && e.date <= sunday)
        .cloned()
        .collect();
    let status = compute_status(&habit, &window, reference);
    let current_week_count = compute_week_count(&window);
    HabitWithStatus {
        habit,
        status,
        current_week_count,
        entries: window,
    }
}

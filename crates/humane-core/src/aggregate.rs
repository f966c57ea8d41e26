//! Dashboard aggregation.
//!
//! Rolls per-habit statuses into category sections and a summary. The
//! aggregation is a pure function of its inputs and can be re-run from
//! scratch whenever the stores change.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::habit::{evaluate, week_window, Category, HabitWithStatus, Status};
use crate::storage::{EntryStore, HabitStore};

/// Counts over the de-duplicated habit list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub due_today: usize,
    pub overdue: usize,
    pub done_today: usize,
    pub on_track: usize,
    pub total: usize,
}

/// Habits of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    pub category: Category,
    pub label: String,
    pub color: String,
    /// Presentation-owned flag, passed through unchanged.
    pub collapsed: bool,
    pub habits: Vec<HabitWithStatus>,
}

/// Read-only view model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub sections: Vec<CategorySection>,
    pub summary: SummaryStats,
}

impl Default for Dashboard {
    fn default() -> Self {
        aggregate(Vec::new(), &[])
    }
}

impl Dashboard {
    pub fn section(&self, category: Category) -> Option<&CategorySection> {
        self.sections.iter().find(|s| s.category == category)
    }

    pub fn habits(&self) -> impl Iterator<Item = &HabitWithStatus> {
        self.sections.iter().flat_map(|s| s.habits.iter())
    }
}

/// Keep one habit per exact name.
///
/// Upstream double-writes can leave two habits with the same name. The one
/// with the most entries in the window survives; ties keep the first seen.
/// Survivors stay at the position where their name first appeared.
pub fn dedupe_by_name(habits: Vec<HabitWithStatus>) -> Vec<HabitWithStatus> {
    let mut slots: Vec<HabitWithStatus> = Vec::with_capacity(habits.len());
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for candidate in habits {
        match by_name.get(&candidate.habit.name).copied() {
            Some(slot) => {
                let kept = &mut slots[slot];
                if candidate.entries.len() > kept.entries.len() {
                    tracing::warn!(
                        name = %candidate.habit.name,
                        kept = %candidate.habit.id,
                        dropped = %kept.habit.id,
                        "duplicate habit name, keeping the one with more entries"
                    );
                    *kept = candidate;
                } else {
                    tracing::warn!(
                        name = %candidate.habit.name,
                        kept = %kept.habit.id,
                        dropped = %candidate.habit.id,
                        "duplicate habit name, keeping the first seen"
                    );
                }
            }
            None => {
                by_name.insert(candidate.habit.name.clone(), slots.len());
                slots.push(candidate);
            }
        }
    }
    slots
}

pub fn summarize(habits: &[HabitWithStatus]) -> SummaryStats {
    let count = |status: Status| habits.iter().filter(|h| h.status == status).count();
    SummaryStats {
        due_today: count(Status::Today),
        overdue: count(Status::Overdue),
        done_today: count(Status::Done),
        on_track: count(Status::Met),
        total: habits.len(),
    }
}

/// Group habits into one section per category, in category order.
///
/// Every category gets a section, empty or not.
pub fn aggregate(habits: Vec<HabitWithStatus>, collapsed: &[Category]) -> Dashboard {
    let habits = dedupe_by_name(habits);
    let summary = summarize(&habits);

    let mut sections: Vec<CategorySection> = Category::ALL
        .iter()
        .map(|&category| CategorySection {
            category,
            label: category.label().to_string(),
            color: category.color().to_string(),
            collapsed: collapsed.contains(&category),
            habits: Vec::new(),
        })
        .collect();
    for habit in habits {
        sections[habit.habit.category.ordinal()].habits.push(habit);
    }

    Dashboard { sections, summary }
}

fn load_statuses(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
    reference: NaiveDate,
) -> Result<Vec<HabitWithStatus>> {
    let (monday, sunday) = week_window(reference);
    let defs = habits.get_by_user_id(user_id)?;
    let window = entries.get_by_user_and_date_range(user_id, monday, sunday)?;
    Ok(defs
        .into_iter()
        .map(|habit| evaluate(habit, &window, reference))
        .collect())
}

/// Fetch a user's habits and week entries, then aggregate.
///
/// Store failures never reach the caller: they are logged and the empty
/// dashboard is returned.
pub fn load_dashboard(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
    reference: NaiveDate,
    collapsed: &[Category],
) -> Dashboard {
    match load_statuses(habits, entries, user_id, reference) {
        Ok(statuses) => aggregate(statuses, collapsed),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "failed to load habits, showing empty dashboard");
            aggregate(Vec::new(), collapsed)
        }
    }
}

//! Default habit set for new users.

use super::{validate_user_id, Category, NewHabit};
use crate::error::Result;
use crate::storage::HabitStore;

/// A habit created by [`seed_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultHabit {
    pub name: &'static str,
    pub category: Category,
    pub target_per_week: u8,
}

const DEFAULTS: &[DefaultHabit] = &[
    DefaultHabit { name: "Stretching", category: Category::Mobility, target_per_week: 5 },
    DefaultHabit { name: "Walk", category: Category::Mobility, target_per_week: 5 },
    DefaultHabit { name: "Yoga", category: Category::Mobility, target_per_week: 2 },
    DefaultHabit { name: "Call a friend", category: Category::Connection, target_per_week: 2 },
    DefaultHabit { name: "Family time", category: Category::Connection, target_per_week: 3 },
    DefaultHabit { name: "Meditation", category: Category::Balance, target_per_week: 5 },
    DefaultHabit { name: "Journal", category: Category::Balance, target_per_week: 3 },
    DefaultHabit { name: "Play music", category: Category::Joy, target_per_week: 2 },
    DefaultHabit { name: "Read for fun", category: Category::Joy, target_per_week: 3 },
    DefaultHabit { name: "Push-ups", category: Category::Strength, target_per_week: 3 },
    DefaultHabit { name: "Core work", category: Category::Strength, target_per_week: 3 },
];

pub fn default_habits() -> &'static [DefaultHabit] {
    DEFAULTS
}

/// Nonce used for a seeded habit, so a replayed seed cannot duplicate it.
pub fn seed_nonce(name: &str) -> String {
    format!("seed:{name}")
}

/// Create the default habit set for `user_id` if the user has no habits.
///
/// Returns how many habits were created.
pub fn seed_defaults(habits: &dyn HabitStore, user_id: &str) -> Result<usize> {
    validate_user_id(user_id)?;
    let existing = habits.count_by_user_id(user_id)?;
    if existing > 0 {
        tracing::debug!(user_id, existing, "user already has habits, skipping seed");
        return Ok(0);
    }

    for default in DEFAULTS {
        let new = NewHabit::new(user_id, default.name, default.category, default.target_per_week)
            .with_nonce(seed_nonce(default.name));
        habits.create(new)?;
    }
    tracing::info!(user_id, count = DEFAULTS.len(), "seeded default habits");
    Ok(DEFAULTS.len())
}

//! Habit and entry data model.
//!
//! A [`Habit`] is a per-user definition with a weekly target; an [`Entry`]
//! records one calendar day's completion value for one habit. Everything
//! else in this module (status, cycling, seeding) is derived from these two.

pub mod cycle;
pub mod seed;
pub mod status;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use cycle::{cycle_cell, needs_confirmation, next_value, CycleOutcome, CycleRequest};
pub use seed::{default_habits, seed_defaults, DefaultHabit};
pub use status::{
    compute_status, compute_week_count, days_left_in_week, evaluate, week_window, HabitWithStatus,
    Status,
};

/// Lowest weekly target a habit may have.
pub const MIN_TARGET_PER_WEEK: u8 = 1;
/// Highest weekly target a habit may have (every day).
pub const MAX_TARGET_PER_WEEK: u8 = 7;
/// Largest value an entry may hold (five completions in one day).
pub const MAX_ENTRY_VALUE: f64 = 5.0;
/// Value stored for a partial completion.
pub const PARTIAL_VALUE: f64 = 0.5;

/// Habit category.
///
/// Categories are descriptive only: they decide grouping and color, never
/// status. The declaration order is the display order of dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mobility,
    Connection,
    Balance,
    Joy,
    Strength,
}

impl Category {
    /// All categories in section order.
    pub const ALL: [Category; 5] = [
        Category::Mobility,
        Category::Connection,
        Category::Balance,
        Category::Joy,
        Category::Strength,
    ];

    /// Position of this category in the section ordering table.
    pub fn ordinal(self) -> usize {
        match self {
            Category::Mobility => 0,
            Category::Connection => 1,
            Category::Balance => 2,
            Category::Joy => 3,
            Category::Strength => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Mobility => "mobility",
            Category::Connection => "connection",
            Category::Balance => "balance",
            Category::Joy => "joy",
            Category::Strength => "strength",
        }
    }

    /// Section heading.
    pub fn label(self) -> &'static str {
        match self {
            Category::Mobility => "Movement & Mobility",
            Category::Connection => "Connection",
            Category::Balance => "Inner Balance",
            Category::Joy => "Joy & Play",
            Category::Strength => "Strength Building",
        }
    }

    /// Accent color used by the presentation layer.
    pub fn color(self) -> &'static str {
        match self {
            Category::Mobility => "#3b82f6",
            Category::Connection => "#f59e0b",
            Category::Balance => "#10b981",
            Category::Joy => "#ec4899",
            Category::Strength => "#8b5cf6",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobility" => Ok(Category::Mobility),
            "connection" => Ok(Category::Connection),
            "balance" => Ok(Category::Balance),
            "joy" => Ok(Category::Joy),
            "strength" => Ok(Category::Strength),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

/// A habit definition owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: Category,
    pub target_per_week: u8,
    /// Client-generated idempotency key supplied at creation.
    #[serde(default)]
    pub creation_nonce: Option<String>,
    /// Parent tag-habit, if this habit is grouped under one.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub user_id: String,
    pub name: String,
    pub category: Category,
    pub target_per_week: u8,
    #[serde(default)]
    pub creation_nonce: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl NewHabit {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        target_per_week: u8,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            category,
            target_per_week,
            creation_nonce: None,
            parent_id: None,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.creation_nonce = Some(nonce.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Check required fields and the target range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(&self.user_id)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        validate_target(self.target_per_week)
    }
}

/// Partial update for a habit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub target_per_week: Option<u8>,
    /// `Some(None)` clears the parent link.
    pub parent_id: Option<Option<String>>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.target_per_week.is_none()
            && self.parent_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::Empty("name"));
            }
        }
        if let Some(target) = self.target_per_week {
            validate_target(target)?;
        }
        Ok(())
    }

    /// Apply the patch to `habit`, bumping `updated_at`.
    pub fn apply(&self, habit: &mut Habit, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            habit.name = name.clone();
        }
        if let Some(category) = self.category {
            habit.category = category;
        }
        if let Some(target) = self.target_per_week {
            habit.target_per_week = target;
        }
        if let Some(parent) = &self.parent_id {
            habit.parent_id = parent.clone();
        }
        habit.updated_at = now;
    }
}

/// One day's recorded value for a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Whether this entry counts toward the weekly target.
    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }

    /// Whether this entry is at least one full completion.
    pub fn is_complete(&self) -> bool {
        self.value >= 1.0
    }
}

/// Input for recording an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl NewEntry {
    pub fn new(
        habit_id: impl Into<String>,
        user_id: impl Into<String>,
        date: NaiveDate,
        value: f64,
    ) -> Self {
        Self {
            habit_id: habit_id.into(),
            user_id: user_id.into(),
            date,
            value,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(&self.user_id)?;
        if self.habit_id.trim().is_empty() {
            return Err(ValidationError::Empty("habit_id"));
        }
        validate_entry_value(self.value)
    }
}

pub(crate) fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.trim().is_empty() {
        Err(ValidationError::Empty("user_id"))
    } else {
        Ok(())
    }
}

pub(crate) fn validate_target(target: u8) -> Result<(), ValidationError> {
    if (MIN_TARGET_PER_WEEK..=MAX_TARGET_PER_WEEK).contains(&target) {
        Ok(())
    } else {
        Err(ValidationError::TargetOutOfRange(i64::from(target)))
    }
}

/// Zero is never stored; an absent entry means "no record".
pub(crate) fn validate_entry_value(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 && value <= MAX_ENTRY_VALUE {
        Ok(())
    } else {
        Err(ValidationError::InvalidEntryValue(value))
    }
}

/// Parse a `YYYY-MM-DD` date, also accepting a full timestamp whose first
/// ten characters are the day.
pub fn parse_day(s: &str) -> Result<NaiveDate, ValidationError> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

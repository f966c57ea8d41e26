//! # Humane Tracker Core Library
//!
//! This library provides the core logic for the Humane habit tracker: a
//! weekly-target tracker with no streaks and no penalties. The `humane` CLI
//! binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Habits**: Definitions, daily entries and the pure status rules
//!   evaluated against a Monday-start week
//! - **Storage**: SQLite-backed habit and entry stores plus TOML
//!   configuration
//! - **Aggregation**: Category sections and summary counts for a dashboard
//! - **Reconciliation**: Merge-or-abandon flow for data recorded before
//!   sign-in
//! - **Backup**: JSON export, import and offline repair of backup documents
//!
//! ## Key Components
//!
//! - [`compute_status`]: Status of one habit on a reference date
//! - [`cycle_cell`]: Click-to-cycle for a single day cell
//! - [`load_dashboard`]: Fetch and aggregate a user's week
//! - [`reconcile`]: Sign-in flow for local anonymous data
//! - [`SqliteStore`]: Persistence for habits and entries
//! - [`Config`]: Application configuration management

pub mod aggregate;
pub mod backup;
pub mod error;
pub mod events;
pub mod habit;
pub mod reconcile;
pub mod storage;

pub use aggregate::{aggregate, load_dashboard, CategorySection, Dashboard, SummaryStats};
pub use backup::BackupDocument;
pub use error::{AuthError, ConfigError, CoreError, Result, StoreError, ValidationError};
pub use events::{ChangeFeed, ChangeSubscription, StoreChange};
pub use habit::{
    compute_status, compute_week_count, cycle_cell, next_value, seed_defaults, week_window,
    Category, CycleOutcome, CycleRequest, Entry, Habit, HabitPatch, HabitWithStatus, NewEntry,
    NewHabit, Status,
};
pub use reconcile::{
    reconcile, Authenticator, LocalDataSummary, MergeChoice, MergePrompt, ReconciliationResult,
    ReconciliationState,
};
pub use storage::{Config, EntryStore, HabitStore, SqliteStore};

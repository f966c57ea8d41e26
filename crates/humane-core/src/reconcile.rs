//! Sign-in reconciliation for anonymous local data.
//!
//! Before signing in, habits recorded under the anonymous pseudo-user are
//! either kept for the sync layer to merge, deleted, or the sign-in is
//! called off. The user always makes that choice; nothing is deleted
//! without an explicit [`MergeChoice::Abandon`].
//!
//! ```text
//! inspect ──none──▶ NoLocalData ─────────────────────────┐
//!    │                                                  ▼
//!    └─some─▶ LocalDataPresent ─merge──▶ Merging ───▶ login ─ok──▶ Complete
//!                     │        ─abandon▶ Abandoning ─▶   │
//!                     │                      │           └─err─▶ Failed
//!                     └─cancel─▶ Cancelled   └─err─▶ Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, CoreError, Result};
use crate::storage::{EntryStore, HabitStore};

/// How many habit names the prompt summary carries.
pub const SUMMARY_NAME_LIMIT: usize = 5;

/// The user's answer when anonymous data exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeChoice {
    /// Keep local data; the sync layer folds it into the account.
    Merge,
    /// Delete local data, then sign in.
    Abandon,
    /// Do not sign in.
    Cancel,
}

impl std::str::FromStr for MergeChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "m" => Ok(MergeChoice::Merge),
            "abandon" | "a" => Ok(MergeChoice::Abandon),
            "cancel" | "c" => Ok(MergeChoice::Cancel),
            other => Err(format!("unknown choice '{other}' (expected merge, abandon or cancel)")),
        }
    }
}

/// What the prompt shows about the anonymous partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDataSummary {
    pub habit_count: usize,
    pub entry_count: usize,
    /// First few habit names, oldest first.
    pub habit_names: Vec<String>,
}

/// States of one sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationState {
    NoLocalData,
    LocalDataPresent,
    Merging,
    Abandoning,
    Cancelled,
    Complete,
    Failed,
}

impl ReconciliationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReconciliationState::Cancelled
                | ReconciliationState::Complete
                | ReconciliationState::Failed
        )
    }
}

/// Asks the user what to do with anonymous data.
pub trait MergePrompt {
    fn prompt_merge_choice(&mut self, summary: &LocalDataSummary) -> MergeChoice;
}

impl<F> MergePrompt for F
where
    F: FnMut(&LocalDataSummary) -> MergeChoice,
{
    fn prompt_merge_choice(&mut self, summary: &LocalDataSummary) -> MergeChoice {
        self(summary)
    }
}

/// Answers every prompt with the same choice.
#[derive(Debug, Clone, Copy)]
pub struct PresetChoice(pub MergeChoice);

impl MergePrompt for PresetChoice {
    fn prompt_merge_choice(&mut self, _summary: &LocalDataSummary) -> MergeChoice {
        self.0
    }
}

/// Performs the actual sign-in against the remote endpoint.
pub trait Authenticator {
    fn login(&mut self) -> std::result::Result<(), AuthError>;
}

impl<F> Authenticator for F
where
    F: FnMut() -> std::result::Result<(), AuthError>,
{
    fn login(&mut self) -> std::result::Result<(), AuthError> {
        self()
    }
}

/// Why a sign-in attempt ended in [`ReconciliationState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ReconcileFailure {
    /// The anonymous partition could not be read.
    Inspect(String),
    /// Deleting anonymous data failed part-way.
    Abandon(String),
    /// The login call failed.
    Auth(String),
}

impl ReconcileFailure {
    pub fn message(&self) -> &str {
        match self {
            ReconcileFailure::Inspect(m) | ReconcileFailure::Abandon(m) | ReconcileFailure::Auth(m) => m,
        }
    }
}

impl fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ReconcileFailure> for CoreError {
    fn from(failure: ReconcileFailure) -> Self {
        match failure {
            ReconcileFailure::Auth(message) => CoreError::Auth(AuthError::LoginFailed(message)),
            ReconcileFailure::Inspect(message) | ReconcileFailure::Abandon(message) => {
                CoreError::Reconciliation(message)
            }
        }
    }
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Terminal state: `Complete`, `Cancelled` or `Failed`.
    pub state: ReconciliationState,
    /// Every state visited, in order.
    pub transitions: Vec<ReconciliationState>,
    pub summary: Option<LocalDataSummary>,
    pub choice: Option<MergeChoice>,
    pub deleted_entries: usize,
    pub deleted_habits: usize,
    /// Whether login was called and succeeded.
    pub logged_in: bool,
    pub failure: Option<ReconcileFailure>,
}

impl ReconciliationResult {
    /// Cancelling counts as success: the user backed out on purpose.
    pub fn is_success(&self) -> bool {
        self.state != ReconciliationState::Failed
    }

    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(ReconcileFailure::message)
    }

    /// Turn a failed attempt into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.state == ReconciliationState::Failed {
            if let Some(failure) = self.failure.clone() {
                return Err(failure.into());
            }
        }
        Ok(self)
    }
}

/// Build the prompt summary for `user_id`'s partition.
pub fn summarize_local_data(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
) -> Result<LocalDataSummary> {
    let local = habits.get_by_user_id(user_id)?;
    let entry_count = entries.count_by_user_id(user_id)?;
    Ok(LocalDataSummary {
        habit_count: local.len(),
        entry_count,
        habit_names: local
            .into_iter()
            .take(SUMMARY_NAME_LIMIT)
            .map(|h| h.name)
            .collect(),
    })
}

struct Attempt {
    result: ReconciliationResult,
}

impl Attempt {
    fn new() -> Self {
        Self {
            result: ReconciliationResult {
                state: ReconciliationState::NoLocalData,
                transitions: Vec::new(),
                summary: None,
                choice: None,
                deleted_entries: 0,
                deleted_habits: 0,
                logged_in: false,
                failure: None,
            },
        }
    }

    fn enter(&mut self, state: ReconciliationState) {
        tracing::debug!(from = ?self.result.transitions.last(), to = ?state, "sign-in transition");
        self.result.state = state;
        self.result.transitions.push(state);
    }

    fn fail(mut self, failure: ReconcileFailure) -> ReconciliationResult {
        tracing::warn!(error = %failure, "sign-in failed");
        self.result.failure = Some(failure);
        self.enter(ReconciliationState::Failed);
        self.result
    }

    fn finish(mut self, state: ReconciliationState) -> ReconciliationResult {
        self.enter(state);
        tracing::info!(
            state = ?state,
            choice = ?self.result.choice,
            deleted_entries = self.result.deleted_entries,
            deleted_habits = self.result.deleted_habits,
            "sign-in finished"
        );
        self.result
    }

    fn login(mut self, auth: &mut dyn Authenticator) -> ReconciliationResult {
        match auth.login() {
            Ok(()) => {
                self.result.logged_in = true;
                self.finish(ReconciliationState::Complete)
            }
            Err(e) => self.fail(ReconcileFailure::Auth(e.to_string())),
        }
    }
}

/// Run the sign-in protocol for the anonymous partition `anonymous_user_id`.
///
/// With no local habits the user signs in straight away. Otherwise the
/// prompt decides:
/// - `Cancel`: nothing is touched and `login` is not called.
/// - `Merge`: nothing is deleted; `login` is called.
/// - `Abandon`: anonymous entries are deleted, then anonymous habits, then
///   `login` is called. If either deletion fails, `login` is not called.
///
/// Failures are reported in the result, never panicked or dropped.
pub fn reconcile(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    anonymous_user_id: &str,
    prompt: &mut dyn MergePrompt,
    auth: &mut dyn Authenticator,
) -> ReconciliationResult {
    let mut attempt = Attempt::new();

    let local_habits = match habits.count_by_user_id(anonymous_user_id) {
        Ok(n) => n,
        Err(e) => return attempt.fail(ReconcileFailure::Inspect(e.to_string())),
    };
    if local_habits == 0 {
        attempt.enter(ReconciliationState::NoLocalData);
        return attempt.login(auth);
    }

    let summary = match summarize_local_data(habits, entries, anonymous_user_id) {
        Ok(s) => s,
        Err(e) => return attempt.fail(ReconcileFailure::Inspect(e.to_string())),
    };
    attempt.enter(ReconciliationState::LocalDataPresent);
    let choice = prompt.prompt_merge_choice(&summary);
    attempt.result.summary = Some(summary);
    attempt.result.choice = Some(choice);

    match choice {
        MergeChoice::Cancel => attempt.finish(ReconciliationState::Cancelled),
        MergeChoice::Merge => {
            attempt.enter(ReconciliationState::Merging);
            attempt.login(auth)
        }
        MergeChoice::Abandon => {
            attempt.enter(ReconciliationState::Abandoning);
            if let Err(failure) = abandon(habits, entries, anonymous_user_id, &mut attempt.result) {
                return attempt.fail(failure);
            }
            attempt.login(auth)
        }
    }
}

/// Entries first, then habits, then a sweep for entries written in between
/// so no entry outlives its habit.
fn abandon(
    habits: &dyn HabitStore,
    entries: &dyn EntryStore,
    user_id: &str,
    result: &mut ReconciliationResult,
) -> std::result::Result<(), ReconcileFailure> {
    result.deleted_entries = entries
        .delete_by_user_id(user_id)
        .map_err(|e| ReconcileFailure::Abandon(format!("failed to delete local entries: {e}")))?;

    result.deleted_habits = habits.delete_by_user_id(user_id).map_err(|e| {
        ReconcileFailure::Abandon(format!(
            "deleted {} local entries but failed to delete local habits: {e}",
            result.deleted_entries
        ))
    })?;

    let stragglers = entries.delete_by_user_id(user_id).map_err(|e| {
        ReconcileFailure::Abandon(format!("failed to delete late local entries: {e}"))
    })?;
    if stragglers > 0 {
        tracing::warn!(user_id, stragglers, "entries were written while abandoning local data");
        result.deleted_entries += stragglers;
    }
    Ok(())
}

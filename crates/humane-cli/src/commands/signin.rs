//! Sign-in and sign-out.
//!
//! There is no remote account service behind the CLI: logging in accepts
//! any user id other than the anonymous one and records it as the session
//! user. Choosing merge copies the anonymous habits and entries into the
//! account.

use humane_core::backup;
use humane_core::error::AuthError;
use humane_core::reconcile::PresetChoice;
use humane_core::{reconcile, LocalDataSummary, MergeChoice, MergePrompt, ReconciliationState};

use super::{ask, CmdResult, Session};

/// Prompts on the terminal. End of input or an unreadable answer cancels.
struct TerminalPrompt;

impl MergePrompt for TerminalPrompt {
    fn prompt_merge_choice(&mut self, summary: &LocalDataSummary) -> MergeChoice {
        eprintln!(
            "You have {} habits and {} entries recorded while signed out:",
            summary.habit_count, summary.entry_count
        );
        for name in &summary.habit_names {
            eprintln!("  - {name}");
        }
        if summary.habit_count > summary.habit_names.len() {
            eprintln!("  ... and {} more", summary.habit_count - summary.habit_names.len());
        }
        loop {
            match ask("Merge into your account, abandon them, or cancel? [m/a/c] ") {
                Ok(Some(answer)) => match answer.parse::<MergeChoice>() {
                    Ok(choice) => return choice,
                    Err(e) => eprintln!("{e}"),
                },
                Ok(None) => return MergeChoice::Cancel,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read merge choice");
                    return MergeChoice::Cancel;
                }
            }
        }
    }
}

pub fn signin(user_id: &str, choice: Option<MergeChoice>) -> CmdResult {
    let mut session = Session::open()?;
    let anonymous = session.config.session.anonymous_user_id.clone();

    if let Some(current) = &session.config.session.user_id {
        if current == user_id {
            println!("Already signed in as {user_id}");
            return Ok(());
        }
        return Err(format!("signed in as {current}; run `humane signout` first").into());
    }

    let mut login = || -> Result<(), AuthError> {
        if user_id.trim().is_empty() || user_id == anonymous {
            return Err(AuthError::LoginFailed(format!("'{user_id}' is not a valid account")));
        }
        Ok(())
    };

    let result = match choice {
        Some(choice) => reconcile(
            &session.store,
            &session.store,
            &anonymous,
            &mut PresetChoice(choice),
            &mut login,
        ),
        None => reconcile(
            &session.store,
            &session.store,
            &anonymous,
            &mut TerminalPrompt,
            &mut login,
        ),
    };

    match result.state {
        ReconciliationState::Cancelled => {
            println!("Sign-in cancelled; still using local data");
            return Ok(());
        }
        ReconciliationState::Failed => {
            eprintln!("Sign-in failed; still using local data");
            return result.into_result().map(drop).map_err(Into::into);
        }
        _ => {}
    }

    if result.choice == Some(MergeChoice::Merge) {
        let local = backup::export(&session.store, &session.store, &anonymous)?;
        let report = backup::import(&session.store, &session.store, user_id, &local)?;
        println!(
            "Merged {} habits and {} entries into {user_id}",
            report.habits_created, report.entries_written
        );
    }
    if result.choice == Some(MergeChoice::Abandon) {
        println!(
            "Removed {} local habits and {} entries",
            result.deleted_habits, result.deleted_entries
        );
    }

    session.config.session.user_id = Some(user_id.to_string());
    session.save_config()?;
    println!("Signed in as {user_id}");
    Ok(())
}

pub fn signout() -> CmdResult {
    let mut session = Session::open()?;
    match session.config.session.user_id.take() {
        Some(user_id) => {
            session.save_config()?;
            println!("Signed out of {user_id}; now using local data");
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

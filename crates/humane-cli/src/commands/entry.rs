//! Entry commands for CLI.

use clap::Subcommand;
use humane_core::habit::week_window;
use humane_core::{cycle_cell, CycleOutcome, CycleRequest, EntryStore};

use super::{confirm, date_or_today, format_value, today, CmdResult, Session};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Advance one day cell: none, 1, 2, 3, 4, 5, 0.5, none
    Cycle {
        /// Habit ID
        habit_id: String,
        /// Day to change (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Skip the confirmation for days before yesterday or in the future
        #[arg(long)]
        yes: bool,
    },
    /// List the entries of one week
    List {
        /// Any day of the week (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: EntryAction) -> CmdResult {
    let session = Session::open()?;

    match action {
        EntryAction::Cycle {
            habit_id,
            date,
            yes,
        } => {
            let habit = session.habit(&habit_id)?;
            let date = date_or_today(date.as_deref())?;
            let request = CycleRequest::new(&habit.id, session.user_id(), date, today());
            let ask = session.config.tracker.confirm_historical_edits && !yes;

            let mut prompt_error = None;
            let outcome = cycle_cell(&session.store, &request, |req| {
                if !ask {
                    return true;
                }
                match confirm(&format!("Change {} on {}?", habit.name, req.date)) {
                    Ok(answer) => answer,
                    Err(e) => {
                        prompt_error = Some(e);
                        false
                    }
                }
            })?;
            if let Some(e) = prompt_error {
                return Err(e.into());
            }

            match outcome {
                CycleOutcome::Created { value, .. } => {
                    println!("{} {date}: none -> {}", habit.name, format_value(Some(value)));
                }
                CycleOutcome::Updated { from, to, .. } => {
                    println!(
                        "{} {date}: {} -> {}",
                        habit.name,
                        format_value(Some(from)),
                        format_value(Some(to))
                    );
                }
                CycleOutcome::Deleted { from, .. } => {
                    println!("{} {date}: {} -> none", habit.name, format_value(Some(from)));
                }
                CycleOutcome::Declined => println!("{} {date}: unchanged", habit.name),
            }
        }
        EntryAction::List { date, json } => {
            let (monday, sunday) = week_window(date_or_today(date.as_deref())?);
            let entries = session
                .store
                .get_by_user_and_date_range(session.user_id(), monday, sunday)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}  {}  {}", entry.date, entry.habit_id, entry.value);
                }
            }
        }
    }
    Ok(())
}

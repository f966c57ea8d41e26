//! Backup file commands for CLI.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use humane_core::backup::{self, BackupDocument};

use super::{CmdResult, Session};

#[derive(Subcommand)]
pub enum BackupAction {
    /// List habits of a backup grouped by category
    List {
        /// Backup JSON file
        file: PathBuf,
        /// Print per-category totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find habits whose name contains a pattern (case-insensitive)
    Find {
        /// Backup JSON file
        file: PathBuf,
        /// Name fragment
        pattern: String,
    },
    /// Show the entries of one habit
    Entries {
        /// Backup JSON file
        file: PathBuf,
        /// Habit ID
        habit_id: String,
    },
    /// Merge habits into one, keeping the highest value on shared days
    Merge {
        /// Backup JSON file
        file: PathBuf,
        /// Habit ID to keep
        #[arg(long)]
        into: String,
        /// Habit ID to merge and remove (repeatable)
        #[arg(long = "from", required = true)]
        sources: Vec<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the current user's habits and entries
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a backup into the current user
    Import {
        /// Backup JSON file
        file: PathBuf,
    },
}

fn write_document(doc: &BackupDocument, output: Option<&Path>) -> CmdResult {
    match output {
        Some(path) => {
            doc.save(path)?;
            eprintln!("Written to {}", path.display());
        }
        None => println!("{}", doc.to_json_pretty()?),
    }
    Ok(())
}

pub fn run(action: BackupAction) -> CmdResult {
    match action {
        BackupAction::List { file, json } => {
            let doc = BackupDocument::load(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc.category_stats())?);
                return Ok(());
            }
            for (category, mut habits) in doc.categories() {
                println!("\n{}", category.to_uppercase());
                println!("{}", "-".repeat(40));
                habits.sort_by(|a, b| a.name.cmp(&b.name));
                for habit in habits {
                    let entries = doc.entries_for_habit(&habit.id).len();
                    println!("  {:<30} ({entries:>3} entries)", habit.name);
                }
            }
        }
        BackupAction::Find { file, pattern } => {
            let doc = BackupDocument::load(&file)?;
            let found = doc.find_habits_by_name(&pattern);
            if found.is_empty() {
                println!("No habits match '{pattern}'");
            }
            for habit in found {
                println!(
                    "{}  {}  [{}]",
                    habit.id,
                    habit.name,
                    habit.category_or_default()
                );
            }
        }
        BackupAction::Entries { file, habit_id } => {
            let doc = BackupDocument::load(&file)?;
            let mut entries = doc.entries_for_habit(&habit_id);
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            println!("Entries: {}", doc.habit_name(&habit_id));
            if entries.is_empty() {
                println!("  No entries");
            }
            for entry in entries {
                let created = entry.created_at.as_deref().unwrap_or("");
                println!(
                    "  {}  {:>4}  {}",
                    entry.day(),
                    entry.value,
                    created.get(..10).unwrap_or(created)
                );
            }
        }
        BackupAction::Merge {
            file,
            into,
            sources,
            output,
        } => {
            let doc = BackupDocument::load(&file)?;
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            for source in &sources {
                if doc.habit(source).is_none() {
                    return Err(format!("habit not found in backup: {source}").into());
                }
            }
            let merged = doc.merge_habits(&into, &sources)?;
            eprintln!(
                "Merged into {} entries for {}",
                merged.entries_for_habit(&into).len(),
                merged.habit_name(&into)
            );
            write_document(&merged, output.as_deref())?;
        }
        BackupAction::Export { output } => {
            let session = Session::open()?;
            let doc = backup::export(&session.store, &session.store, session.user_id())?;
            write_document(&doc, output.as_deref())?;
        }
        BackupAction::Import { file } => {
            let doc = BackupDocument::load(&file)?;
            let session = Session::open()?;
            let report = backup::import(&session.store, &session.store, session.user_id(), &doc)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

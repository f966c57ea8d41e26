//! Habit management commands for CLI.

use clap::Subcommand;
use humane_core::{seed_defaults, Category, HabitPatch, HabitStore, NewHabit};
use uuid::Uuid;

use super::{CmdResult, Session};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Category: mobility, connection, balance, joy or strength
        #[arg(long)]
        category: Category,
        /// Days per week to aim for (1-7)
        #[arg(long, default_value = "3")]
        target: u8,
        /// Parent habit ID
        #[arg(long)]
        parent: Option<String>,
        /// Creation nonce; repeating a create with the same nonce is a no-op
        #[arg(long)]
        nonce: Option<String>,
    },
    /// List habits of the current user
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<Category>,
        /// New weekly target
        #[arg(long)]
        target: Option<u8>,
        /// New parent habit ID
        #[arg(long, conflicts_with = "clear_parent")]
        parent: Option<String>,
        /// Remove the parent link
        #[arg(long)]
        clear_parent: bool,
    },
    /// Delete a habit and its entries
    Rm {
        /// Habit ID
        id: String,
    },
    /// Create the default habit set if the current user has none
    Seed,
}

pub fn run(action: HabitAction) -> CmdResult {
    let session = Session::open()?;
    let user_id = session.user_id().to_string();

    match action {
        HabitAction::Add {
            name,
            category,
            target,
            parent,
            nonce,
        } => {
            if let Some(parent) = &parent {
                session.habit(parent)?;
            }
            let mut new = NewHabit::new(&user_id, name, category, target)
                .with_nonce(nonce.unwrap_or_else(|| Uuid::new_v4().to_string()));
            if let Some(parent) = parent {
                new = new.with_parent(parent);
            }
            let id = session.store.create(new)?;
            let habit = session.habit(&id)?;
            println!("Habit created: {id}");
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { json } => {
            let habits = session.store.get_by_user_id(&user_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits yet. Add one with `humane habit add` or run `humane habit seed`.");
            } else {
                for habit in &habits {
                    println!(
                        "{}  {:<10}  {}/week  {}",
                        habit.id,
                        habit.category.as_str(),
                        habit.target_per_week,
                        habit.name
                    );
                }
            }
        }
        HabitAction::Update {
            id,
            name,
            category,
            target,
            parent,
            clear_parent,
        } => {
            session.habit(&id)?;
            if let Some(parent) = &parent {
                if parent == &id {
                    return Err("a habit cannot be its own parent".into());
                }
                session.habit(parent)?;
            }
            let patch = HabitPatch {
                name,
                category,
                target_per_week: target,
                parent_id: if clear_parent { Some(None) } else { parent.map(Some) },
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            session.store.update(&id, &patch)?;
            println!("Habit updated:");
            println!("{}", serde_json::to_string_pretty(&session.habit(&id)?)?);
        }
        HabitAction::Rm { id } => {
            session.habit(&id)?;
            let removed = session.store.delete_habit_with_entries(&id)?;
            println!("Habit deleted: {id} ({removed} entries removed)");
        }
        HabitAction::Seed => {
            let created = seed_defaults(&session.store, &user_id)?;
            if created == 0 {
                println!("Habits already exist; nothing seeded");
            } else {
                println!("Seeded {created} habits");
            }
        }
    }
    Ok(())
}

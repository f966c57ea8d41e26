use clap::Subcommand;
use humane_core::{Category, Config};

use super::{CmdResult, Session};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "session.user_id", "tracker.confirm_historical_edits")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value ("none" clears an optional value)
        value: String,
    },
    /// Show all config values
    Show,
    /// Collapse or expand a dashboard section
    ToggleSection {
        category: Category,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    let mut session = Session::open()?;
    match action {
        ConfigAction::Get { key } => match session.config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            session.config.set(&key, &value)?;
            session.save_config()?;
            println!("ok");
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&session.config)?);
        }
        ConfigAction::ToggleSection { category } => {
            let collapsed = session.config.toggle_collapsed(category);
            session.save_config()?;
            println!(
                "{} {}",
                category.label(),
                if collapsed { "collapsed" } else { "expanded" }
            );
        }
        ConfigAction::Reset => {
            session.config = Config::default();
            session.save_config()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

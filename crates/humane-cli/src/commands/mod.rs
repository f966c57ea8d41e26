pub mod backup;
pub mod config;
pub mod entry;
pub mod habit;
pub mod signin;
pub mod status;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use humane_core::habit::parse_day;
use humane_core::storage::data_dir;
use humane_core::{Config, CoreError, Habit, HabitStore, SqliteStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Config and store of the active data directory.
pub struct Session {
    pub dir: PathBuf,
    pub config: Config,
    pub store: SqliteStore,
}

impl Session {
    pub fn open() -> Result<Self, CoreError> {
        let dir = data_dir()?;
        let config = Config::load_from(&dir)?;
        let store = SqliteStore::open_at(&dir.join("humane.db"))?;
        Ok(Self { dir, config, store })
    }

    pub fn user_id(&self) -> &str {
        self.config.active_user_id()
    }

    pub fn save_config(&self) -> Result<(), CoreError> {
        self.config.save_to(&self.dir)
    }

    /// Look up a habit of the active user.
    pub fn habit(&self, id: &str) -> Result<Habit, CoreError> {
        match self.store.get(id)? {
            Some(habit) if habit.user_id == self.user_id() => Ok(habit),
            _ => Err(CoreError::habit_not_found(id)),
        }
    }
}

/// `--date` value, or today in local time.
pub fn date_or_today(arg: Option<&str>) -> Result<NaiveDate, CoreError> {
    match arg {
        Some(s) => Ok(parse_day(s)?),
        None => Ok(today()),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Print `question` to stderr and read one line from stdin.
///
/// Returns `None` on end of input.
pub fn ask(question: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr();
    write!(stderr, "{question}")?;
    stderr.flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let answer = ask(&format!("{question} [y/N] "))?;
    Ok(matches!(
        answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y") | Some("yes")
    ))
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => "none".to_string(),
    }
}

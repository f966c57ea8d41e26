use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use humane_core::MergeChoice;

mod commands;

#[derive(Parser)]
#[command(name = "humane", version, about = "Humane Tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Daily entries
    Entry {
        #[command(subcommand)]
        action: commands::entry::EntryAction,
    },
    /// Show this week's dashboard
    Status {
        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign in, deciding what happens to data recorded while signed out
    Signin {
        /// Account to sign in as
        user_id: String,
        /// Answer the merge prompt up front: merge, abandon or cancel
        #[arg(long)]
        choice: Option<MergeChoice>,
    },
    /// Sign out and return to local data
    Signout,
    /// Inspect, repair and move backup files
    Backup {
        #[command(subcommand)]
        action: commands::backup::BackupAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("HUMANE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Entry { action } => commands::entry::run(action),
        Commands::Status { date, json } => commands::status::run(date.as_deref(), json),
        Commands::Signin { user_id, choice } => commands::signin::signin(&user_id, choice),
        Commands::Signout => commands::signin::signout(),
        Commands::Backup { action } => commands::backup::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "humane", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

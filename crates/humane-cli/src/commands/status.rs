use humane_core::{load_dashboard, week_window};

use super::{date_or_today, CmdResult, Session};

pub fn run(date: Option<&str>, json: bool) -> CmdResult {
    let session = Session::open()?;
    let reference = date_or_today(date)?;
    let dashboard = load_dashboard(
        &session.store,
        &session.store,
        session.user_id(),
        reference,
        &session.config.ui.collapsed_sections,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let (monday, _) = week_window(reference);
    let summary = &dashboard.summary;
    println!("Week of {monday} ({})", session.user_id());
    println!(
        "Due today: {}  Overdue: {}  Done today: {}  On track: {}",
        summary.due_today, summary.overdue, summary.done_today, summary.on_track
    );

    for section in &dashboard.sections {
        if section.habits.is_empty() {
            continue;
        }
        println!();
        if section.collapsed {
            println!("{} ({} habits, collapsed)", section.label, section.habits.len());
            continue;
        }
        println!("{}", section.label);
        for view in &section.habits {
            println!(
                "  {:<24} {}/{}  {}",
                view.habit.name,
                view.current_week_count,
                view.habit.target_per_week,
                view.status.display_bucket()
            );
        }
    }
    Ok(())
}

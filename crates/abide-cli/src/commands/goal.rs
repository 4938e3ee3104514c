use clap::Subcommand;
use serde::Serialize;

use crate::common::open_tracker;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Print this month's target minutes
    Show,
    /// Set this month's target minutes
    Set {
        /// Target minutes for the current month
        minutes: i64,
    },
}

#[derive(Serialize)]
struct GoalSummary {
    target_minutes: i64,
}

pub async fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        GoalAction::Show => {
            let target_minutes = tracker.goal().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&GoalSummary { target_minutes })?
            );
        }
        GoalAction::Set { minutes } => {
            tracker.set_goal(minutes).await?;
            println!("goal set to {minutes} minutes");
        }
    }
    Ok(())
}

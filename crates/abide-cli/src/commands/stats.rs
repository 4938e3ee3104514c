use clap::Subcommand;
use serde::Serialize;

use crate::common::open_tracker;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Minutes finalized today
    Today,
    /// Current and best day streaks
    Streak,
}

#[derive(Serialize)]
struct TodaySummary {
    minutes: u64,
}

pub async fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        StatsAction::Today => {
            let minutes = tracker.today_minutes().await?;
            println!("{}", serde_json::to_string_pretty(&TodaySummary { minutes })?);
        }
        StatsAction::Streak => {
            let streak = tracker.streak().await?;
            println!("{}", serde_json::to_string_pretty(&streak)?);
        }
    }
    Ok(())
}

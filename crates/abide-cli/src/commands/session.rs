use std::time::Duration;

use clap::Subcommand;

use abide_core::Target;

use crate::common::open_tracker;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a timed Bible-reading session
    Read {
        /// Book to read
        #[arg(long)]
        book: String,
        /// Chapter to read
        #[arg(long)]
        chapter: u32,
        /// Stop automatically after this many minutes (default: until Ctrl+C)
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Start a timed prayer session
    Pray {
        /// Stop automatically after this many minutes (default: until Ctrl+C)
        #[arg(long)]
        minutes: Option<u64>,
    },
}

pub async fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let (target, minutes) = match action {
        SessionAction::Read {
            book,
            chapter,
            minutes,
        } => (Target::chapter(book, chapter), minutes),
        SessionAction::Pray { minutes } => (Target::prayer(), minutes),
    };

    let mut tracker = open_tracker()?;

    let started = tracker.start_session(Some(target)).await?;
    if let Some(event) = &started {
        println!("{}", serde_json::to_string_pretty(event)?);
    }

    // Drive the engine at 1 Hz until the cap is reached or the user
    // interrupts. An early Ctrl+C is an early stop, not a cancel: whatever
    // elapsed is finalized below.
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // consume the immediate first tick
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event) = tracker.tick() {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                if let Some(limit) = minutes {
                    if tracker.elapsed_secs() >= limit * 60 {
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    if let Some(event) = tracker.stop_session().await? {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }

    // Refresh the derived views the way a subscribed surface would after
    // the finalization lands.
    let progress = tracker.monthly_progress().await?;
    let streak = tracker.streak().await?;
    println!("{}", serde_json::to_string_pretty(&progress)?);
    println!("{}", serde_json::to_string_pretty(&streak)?);

    Ok(())
}

use clap::Subcommand;

use crate::common::open_tracker;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Current-month minutes against the month's goal
    Month,
    /// Mark a chapter as read
    Complete {
        #[arg(long)]
        book: String,
        #[arg(long)]
        chapter: u32,
    },
    /// Show progress for one chapter
    Chapter {
        #[arg(long)]
        book: String,
        #[arg(long)]
        chapter: u32,
    },
}

pub async fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        ProgressAction::Month => {
            let progress = tracker.monthly_progress().await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        ProgressAction::Complete { book, chapter } => {
            tracker.mark_chapter_complete(&book, chapter).await?;
            println!("{book} {chapter} marked complete");
        }
        ProgressAction::Chapter { book, chapter } => {
            match tracker.chapter_progress(&book, chapter).await? {
                Some(progress) => println!("{}", serde_json::to_string_pretty(&progress)?),
                None => println!("no progress recorded for {book} {chapter}"),
            }
        }
    }
    Ok(())
}

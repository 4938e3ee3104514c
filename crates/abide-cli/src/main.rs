use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "abide", version, about = "Abide CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identity management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Timed reading and prayer sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Daily stats and streaks
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Monthly and chapter progress
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Monthly goal management
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // One current-thread runtime: every operation, including the per-second
    // timer tick, cooperates on a single event loop.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Auth { action } => commands::auth::run(action).await,
            Commands::Session { action } => commands::session::run(action).await,
            Commands::Stats { action } => commands::stats::run(action).await,
            Commands::Progress { action } => commands::progress::run(action).await,
            Commands::Goal { action } => commands::goal::run(action).await,
            Commands::Config { action } => commands::config::run(action).await,
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

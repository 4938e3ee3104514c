use clap::Subcommand;
use uuid::Uuid;

use abide_core::Config;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Set the user identity all operations are scoped to
    Login {
        /// User identifier (UUID)
        user_id: Uuid,
    },
    /// Clear the stored identity
    Logout,
    /// Print the current identity
    Show,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        AuthAction::Login { user_id } => {
            config.user_id = Some(user_id);
            config.save()?;
            println!("logged in as {user_id}");
        }
        AuthAction::Logout => {
            config.user_id = None;
            config.save()?;
            println!("logged out");
        }
        AuthAction::Show => match config.user_id {
            Some(user_id) => println!("{user_id}"),
            None => println!("not logged in"),
        },
    }
    Ok(())
}

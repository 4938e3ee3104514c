use clap::Subcommand;

use abide_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value by key
    Get { key: String },
    /// Set a config value by key
    Set { key: String, value: String },
}

pub async fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}

use std::sync::Arc;

use abide_core::{Config, SqliteStore, Tracker};

/// Open the configured store and build a tracker for the configured user.
/// The identity may be absent; operations that need one fail with a clear
/// error from the core.
pub fn open_tracker() -> Result<Tracker, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open(config.db_path()?)?);
    Ok(Tracker::new(store, config.user_id))
}

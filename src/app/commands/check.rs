use log::*;

use crate::error::*;
use crate::app::AppConfig;

use super::{block_on, connect};

/// Verify the database is reachable.
pub fn execute(config: AppConfig) -> Result<()> {
  block_on(async move {
    let store = connect(&config)?;
    store.batch_execute("SELECT 1").await?;
    info!("Database connection ok.");
    Ok(())
  })
}

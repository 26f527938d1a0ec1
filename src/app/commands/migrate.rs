use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::schema;
use crate::services::Services;

use super::{block_on, connect};

/// Apply the schema and make sure the default category exists.
pub fn execute(config: AppConfig) -> Result<()> {
  block_on(async move {
    let store = connect(&config)?;
    schema::migrate(&store).await?;

    let services = Services::from_app_config(store, &config)?;
    let category = services.categories.ensure_default().await?;
    info!("Default category: {} (id={})", category.name, category.id);
    Ok(())
  })
}

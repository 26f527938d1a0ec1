use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::PgStore;

pub mod migrate;
pub mod check;

/// Build the Postgres store from `db.*` settings.
pub fn connect(config: &AppConfig) -> Result<PgStore> {
  let url = config.get_str("db.url")?
    .ok_or_else(|| Error::invalid("config", "db.url must be set"))?;
  let pool_size = config.get_positive("db.pool_size", num_cpus::get() as i64 * 2)?;
  let retries = config.get_positive("db.connect_retries", 10)?;
  info!("Database pool: size={}", pool_size);
  Ok(PgStore::new(&url, pool_size as usize)?.with_connect_retries(retries as u32))
}

/// Run `fut` to completion on a fresh multi-threaded runtime.
pub fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
  let rt = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;
  rt.block_on(fut)
}

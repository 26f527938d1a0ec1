use log::*;

use std::time::Duration;

use async_trait::async_trait;

use tokio::time::sleep;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, PoolError, RecyclingMethod};
use tokio_postgres::{NoTls, Row, types::ToSql};

use crate::error::*;

use super::{Store, Transaction};

const DEFAULT_RETRIES: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Postgres backed store.  Every transaction holds one pooled connection
/// from `begin` until `commit`/`rollback`.
#[derive(Clone)]
pub struct PgStore {
  pool: Pool,
  connect_retries: u32,
}

impl PgStore {
  pub fn new(db_url: &str, pool_size: usize) -> Result<PgStore> {
    let pg_config: tokio_postgres::Config = db_url.parse()?;
    let mgr = Manager::from_config(pg_config, NoTls, ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    let pool = Pool::builder(mgr)
      .max_size(pool_size)
      .build()
      .map_err(anyhow::Error::from)?;

    Ok(PgStore {
      pool,
      connect_retries: DEFAULT_RETRIES,
    })
  }

  pub fn with_connect_retries(mut self, retries: u32) -> Self {
    self.connect_retries = retries.max(1);
    self
  }

  pub fn pool(&self) -> &Pool {
    &self.pool
  }

  /// Get a pooled connection, waiting for the database to come up.
  pub async fn get_client(&self) -> Result<Object> {
    let mut retries = 0u32;
    loop {
      match self.pool.get().await {
        Ok(cl) => return Ok(cl),
        Err(err @ PoolError::Timeout(_)) | Err(err @ PoolError::Backend(_)) => {
          retries += 1;
          if retries >= self.connect_retries {
            error!("get_client: giving up after {} attempts: {}", retries, err);
            return Err(Error::Disconnected("Failed to connect to database".to_string()));
          }
          debug!("get_client: attempt {}: {}", retries, err);
          sleep(RETRY_DELAY).await;
        },
        Err(err) => return Err(err.into()),
      }
    }
  }

  /// Run a batch of statements outside of any transaction.
  pub async fn batch_execute(&self, sql: &str) -> Result<()> {
    let cl = self.get_client().await?;
    cl.batch_execute(sql).await.map_err(|err| Error::from_pg(err, sql))
  }
}

#[async_trait]
impl Store for PgStore {
  type Tx = PgTx;

  async fn begin(&self) -> Result<PgTx> {
    let cl = self.get_client().await?;
    cl.batch_execute("BEGIN").await.map_err(|err| Error::from_pg(err, "BEGIN"))?;
    Ok(PgTx { cl: Some(cl) })
  }
}

/// An open transaction on a pooled connection.
///
/// Dropping it without `commit`/`rollback` discards the connection instead
/// of returning it to the pool, which makes the server abort the work.
pub struct PgTx {
  cl: Option<Object>,
}

macro_rules! impl_client_method {
  ($method:ident, $res_ty:ty) => {
    pub async fn $method(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<$res_ty> {
      let cl = self.client()?;
      debug!("{}: [[{}]]", stringify!($method), sql);
      let statement = cl.prepare_cached(sql).await
        .map_err(|err| Error::from_pg(err, sql))?;
      cl.$method(&statement, params).await
        .map_err(|err| Error::from_pg(err, sql))
    }
  };
}

impl PgTx {
  fn client(&self) -> Result<&Object> {
    self.cl.as_ref()
      .ok_or_else(|| Error::Disconnected("transaction already finished".to_string()))
  }

  async fn batch(&self, sql: &str) -> Result<()> {
    let cl = self.client()?;
    debug!("batch: [[{}]]", sql);
    cl.batch_execute(sql).await.map_err(|err| Error::from_pg(err, sql))
  }

  /// Finish the transaction with `sql` and hand the connection back to the pool.
  async fn end(mut self, sql: &str) -> Result<()> {
    let res = self.batch(sql).await;
    if res.is_ok() {
      // connection is clean again.
      drop(self.cl.take());
    }
    res
  }

  impl_client_method!(query, Vec<Row>);
  impl_client_method!(query_one, Row);
  impl_client_method!(query_opt, Option<Row>);
  impl_client_method!(execute, u64);
}

impl Drop for PgTx {
  fn drop(&mut self) {
    if let Some(cl) = self.cl.take() {
      warn!("PgTx dropped while open, discarding connection.");
      drop(Object::take(cl));
    }
  }
}

fn savepoint_name(name: &str) -> Result<&str> {
  if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
    Ok(name)
  } else {
    Err(Error::Other(anyhow::anyhow!("bad savepoint name: {:?}", name)))
  }
}

#[async_trait]
impl Transaction for PgTx {
  async fn savepoint(&mut self, name: &str) -> Result<()> {
    self.batch(&format!("SAVEPOINT {}", savepoint_name(name)?)).await
  }

  async fn rollback_to(&mut self, name: &str) -> Result<()> {
    self.batch(&format!("ROLLBACK TO SAVEPOINT {}", savepoint_name(name)?)).await
  }

  async fn release(&mut self, name: &str) -> Result<()> {
    self.batch(&format!("RELEASE SAVEPOINT {}", savepoint_name(name)?)).await
  }

  async fn commit(self) -> Result<()> {
    self.end("COMMIT").await
  }

  async fn rollback(self) -> Result<()> {
    self.end("ROLLBACK").await
  }
}

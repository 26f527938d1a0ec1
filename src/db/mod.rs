use log::*;

use async_trait::async_trait;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

pub mod util;
pub mod schema;

mod user;
mod category;
mod article;
mod comment;
mod reaction;
mod favorite;
mod follow;
mod notification;
pub use self::{
  user::*,
  category::*,
  article::*,
  comment::*,
  reaction::*,
  favorite::*,
  follow::*,
  notification::*,
};

mod service;
pub use service::*;

pub mod memory;
pub use memory::{MemoryStore, MemoryTx};

/// Unit of work.  Everything done through a transaction becomes visible
/// together on `commit`, or not at all.
#[async_trait]
pub trait Transaction: Send {
  /// Open a nested rollback point.  A failed statement inside it can be
  /// undone with `rollback_to` without aborting the whole transaction.
  async fn savepoint(&mut self, name: &str) -> Result<()>;

  async fn rollback_to(&mut self, name: &str) -> Result<()>;

  async fn release(&mut self, name: &str) -> Result<()>;

  async fn commit(self) -> Result<()>;

  async fn rollback(self) -> Result<()>;
}

pub trait Repositories:
  Transaction + UserRepository + CategoryRepository + ArticleRepository + CommentRepository
  + ReactionRepository + FavoriteRepository + FollowRepository + NotificationRepository
{
}

impl<T> Repositories for T where
  T: Transaction + UserRepository + CategoryRepository + ArticleRepository + CommentRepository
    + ReactionRepository + FavoriteRepository + FollowRepository + NotificationRepository
{
}

/// Source of transactions.  Cheap to clone; clones share the same backend.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
  type Tx: Repositories;

  async fn begin(&self) -> Result<Self::Tx>;
}

/// Commit on success, roll back on failure.  The original error wins over a
/// failed rollback.
pub async fn finish<T: Transaction, R>(tx: T, res: Result<R>) -> Result<R> {
  match res {
    Ok(val) => {
      tx.commit().await?;
      Ok(val)
    },
    Err(err) => {
      if let Err(rb_err) = tx.rollback().await {
        warn!("rollback failed: {}, after: {}", rb_err, err);
      }
      Err(err)
    },
  }
}

/// Run `body` inside a savepoint.  On error the savepoint is rolled back so
/// the enclosing transaction stays usable.
#[macro_export]
macro_rules! with_savepoint {
  ($tx:expr, $name:expr, $body:expr) => {{
    $tx.savepoint($name).await?;
    match $body {
      Ok(val) => {
        $tx.release($name).await?;
        Ok(val)
      },
      Err(err) => {
        $tx.rollback_to($name).await?;
        $tx.release($name).await?;
        Err(err)
      },
    }
  }};
}

/// Wrap one page of a listing with its total count.
pub fn page_of<T>(items: Vec<T>, req: &PageRequest, total: i64) -> Page<T> {
  Page::new(items, req, total.max(0) as u64)
}

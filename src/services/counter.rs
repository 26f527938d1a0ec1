use log::*;

use crate::error::*;
use crate::db::ArticleRepository;
use crate::models::*;

/// Change in LIKE count when a user's reaction goes from `before` to `after`.
pub fn like_delta(before: Option<ReactionType>, after: Option<ReactionType>) -> i64 {
  let was = before.map_or(false, |t| t.is_like());
  let is = after.map_or(false, |t| t.is_like());
  is as i64 - was as i64
}

/// Keeps `comments_count` and `likes_count` in step with the child rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterMaintainer;

impl CounterMaintainer {
  pub async fn comment_added<R>(&self, tx: &mut R, article: ArticleId) -> Result<i64>
  where
    R: ArticleRepository,
  {
    let count = tx.adjust_comments_count(article, 1).await?
      .ok_or_else(|| Error::not_found(format!("article {}", article)))?;
    debug!("article {}: comments_count={}", article, count);
    Ok(count)
  }

  /// Deleting a comment takes its replies along, so the count is rebuilt from
  /// the remaining rows instead of decremented.
  pub async fn comments_removed<R>(&self, tx: &mut R, article: ArticleId) -> Result<i64>
  where
    R: ArticleRepository,
  {
    let count = tx.recount_comments(article).await?
      .ok_or_else(|| Error::not_found(format!("article {}", article)))?;
    debug!("article {}: comments_count={} (recounted)", article, count);
    Ok(count)
  }

  pub async fn reaction_changed<R>(&self, tx: &mut R, article: ArticleId,
      before: Option<ReactionType>, after: Option<ReactionType>) -> Result<()>
  where
    R: ArticleRepository,
  {
    let delta = like_delta(before, after);
    if delta == 0 {
      return Ok(());
    }
    let count = tx.adjust_likes_count(article, delta).await?
      .ok_or_else(|| Error::not_found(format!("article {}", article)))?;
    debug!("article {}: likes_count={} ({:+})", article, count, delta);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use ReactionType::*;

  #[test]
  fn only_like_transitions_move_the_count() {
    assert_eq!(like_delta(None, Some(Like)), 1);
    assert_eq!(like_delta(Some(Like), None), -1);
    assert_eq!(like_delta(Some(Like), Some(Love)), -1);
    assert_eq!(like_delta(Some(Wow), Some(Like)), 1);
    assert_eq!(like_delta(Some(Like), Some(Like)), 0);
    assert_eq!(like_delta(Some(Sad), Some(Angry)), 0);
    assert_eq!(like_delta(None, Some(Laugh)), 0);
  }
}

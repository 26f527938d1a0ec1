use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::models::*;
use crate::with_savepoint;

use super::Service;

pub const DEFAULT_FANOUT_PAGE_SIZE: i64 = 500;

pub fn published_message(author: &User, article: &Article) -> String {
  format!("{} published a new article: {}", author.username, article.title)
}

pub fn comment_message(article: &Article) -> String {
  format!("New comment on your article \"{}\"", article.title)
}

pub fn reply_message() -> String {
  "New reply to your comment".to_string()
}

/// Writes notifications for publish, comment and reply events.
///
/// Delivery is best-effort.  Each batch runs under its own savepoint inside
/// the triggering transaction; a failed batch is rolled back to that
/// savepoint, logged, and never reported to the caller.
#[derive(Debug, Clone, Copy)]
pub struct NotificationFanout {
  pub page_size: i64,
}

impl Default for NotificationFanout {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_FANOUT_PAGE_SIZE,
    }
  }
}

impl NotificationFanout {
  /// Notify every follower of `author`.  Returns how many notifications were written.
  pub async fn article_published<R>(&self, tx: &mut R, article: &Article, author: &User) -> u64
  where
    R: FollowRepository + NotificationRepository + Transaction,
  {
    let mut sent = 0;
    if let Err(err) = self.publish_pages(tx, article, author, &mut sent).await {
      error!("article {}: publish fan-out stopped after {} notifications: {}",
        article.id, sent, err);
    }
    info!("article {}: notified {} followers of {}", article.id, sent, author.username);
    sent
  }

  async fn publish_pages<R>(&self, tx: &mut R, article: &Article, author: &User, sent: &mut u64)
    -> Result<()>
  where
    R: FollowRepository + NotificationRepository + Transaction,
  {
    let message = published_message(author, article);
    let mut after: Option<UserId> = None;
    loop {
      let (count, next): (u64, Option<UserId>) = with_savepoint!(tx, "fanout_page",
        self.publish_page(tx, article, author.id, after, &message).await)?;
      *sent += count;
      match next {
        Some(last) => after = Some(last),
        None => return Ok(()),
      }
    }
  }

  /// One follower page.  Also returns the last follower id when another page may follow.
  async fn publish_page<R>(&self, tx: &mut R, article: &Article, author: UserId,
      after: Option<UserId>, message: &str) -> Result<(u64, Option<UserId>)>
  where
    R: FollowRepository + NotificationRepository,
  {
    let followers = tx.followers_after(author, after, self.page_size).await?;
    let batch: Vec<NewNotification> = followers.iter().map(|follower| NewNotification {
      recipient_id: *follower,
      article_id: article.id,
      message: message.to_string(),
    }).collect();
    let count = tx.insert_notifications(&batch).await?;
    if (followers.len() as i64) < self.page_size {
      Ok((count, None))
    } else {
      Ok((count, followers.last().copied()))
    }
  }

  /// Tell the article's author about a new top level comment.
  pub async fn comment_added<R>(&self, tx: &mut R, article: &Article, commenter: &User) -> u64
  where
    R: NotificationRepository + Transaction,
  {
    if article.author_id == commenter.id {
      return 0;
    }
    let note = NewNotification {
      recipient_id: article.author_id,
      article_id: article.id,
      message: comment_message(article),
    };
    self.notify_one(tx, note, "comment").await
  }

  /// Tell the parent comment's author about a reply.
  pub async fn reply_added<R>(&self, tx: &mut R, article: &Article, parent: &Comment,
      replier: &User) -> u64
  where
    R: NotificationRepository + Transaction,
  {
    if parent.author_id == replier.id {
      return 0;
    }
    let note = NewNotification {
      recipient_id: parent.author_id,
      article_id: article.id,
      message: reply_message(),
    };
    self.notify_one(tx, note, "reply").await
  }

  async fn notify_one<R>(&self, tx: &mut R, note: NewNotification, event: &str) -> u64
  where
    R: NotificationRepository + Transaction,
  {
    let recipient = note.recipient_id;
    let article = note.article_id;
    match self.insert_one(tx, note).await {
      Ok(sent) => sent,
      Err(err) => {
        error!("article {}: {} notification for user {} failed: {}", article, event, recipient, err);
        0
      },
    }
  }

  async fn insert_one<R>(&self, tx: &mut R, note: NewNotification) -> Result<u64>
  where
    R: NotificationRepository + Transaction,
  {
    let batch = [note];
    with_savepoint!(tx, "fanout_one", tx.insert_notifications(&batch).await)
  }
}

impl Service for NotificationFanout {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.page_size = config.get_positive("notification.fanout_page_size", DEFAULT_FANOUT_PAGE_SIZE)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use async_trait::async_trait;
  use chrono::NaiveDateTime;

  use crate::forms::PageRequest;

  /// Follower table of one author plus a notification sink that fails on a
  /// chosen batch.
  #[derive(Default)]
  struct FlakySink {
    followers: Vec<UserId>,
    fail_on_batch: Option<usize>,
    batches: usize,
    stored: Vec<NewNotification>,
    pending: Vec<NewNotification>,
    savepoint_rollbacks: usize,
  }

  #[async_trait]
  impl FollowRepository for FlakySink {
    async fn find_follow(&mut self, _follower: UserId, _following: UserId) -> Result<Option<Follow>> {
      unimplemented!()
    }

    async fn insert_follow(&mut self, _follower: UserId, _following: UserId) -> Result<Follow> {
      unimplemented!()
    }

    async fn delete_follow(&mut self, _follower: UserId, _following: UserId) -> Result<bool> {
      unimplemented!()
    }

    async fn followers_after(&mut self, _user: UserId, after: Option<UserId>, limit: i64)
      -> Result<Vec<UserId>> {
      Ok(self.followers.iter()
        .copied()
        .filter(|id| after.map_or(true, |after| *id > after))
        .take(limit as usize)
        .collect())
    }

    async fn list_followers(&mut self, _user: UserId, _req: &PageRequest) -> Result<Page<User>> {
      unimplemented!()
    }

    async fn list_following(&mut self, _user: UserId, _req: &PageRequest) -> Result<Page<User>> {
      unimplemented!()
    }

    async fn count_followers(&mut self, _user: UserId) -> Result<i64> {
      unimplemented!()
    }

    async fn count_following(&mut self, _user: UserId) -> Result<i64> {
      unimplemented!()
    }
  }

  #[async_trait]
  impl NotificationRepository for FlakySink {
    async fn insert_notifications(&mut self, batch: &[NewNotification]) -> Result<u64> {
      self.batches += 1;
      if Some(self.batches) == self.fail_on_batch {
        return Err(Error::IntegrityViolation("notifications_recipient_id_fkey".to_string()));
      }
      self.pending.extend(batch.iter().cloned());
      Ok(batch.len() as u64)
    }

    async fn find_notification(&mut self, _id: NotificationId) -> Result<Option<Notification>> {
      unimplemented!()
    }

    async fn list_notifications(&mut self, _user: UserId, _unread_only: bool, _req: &PageRequest)
      -> Result<Page<Notification>> {
      unimplemented!()
    }

    async fn mark_read(&mut self, _id: NotificationId) -> Result<bool> {
      unimplemented!()
    }

    async fn mark_all_read(&mut self, _user: UserId) -> Result<u64> {
      unimplemented!()
    }

    async fn count_unread(&mut self, _user: UserId) -> Result<i64> {
      unimplemented!()
    }
  }

  #[async_trait]
  impl Transaction for FlakySink {
    async fn savepoint(&mut self, _name: &str) -> Result<()> {
      self.pending.clear();
      Ok(())
    }

    async fn rollback_to(&mut self, _name: &str) -> Result<()> {
      self.savepoint_rollbacks += 1;
      self.pending.clear();
      Ok(())
    }

    async fn release(&mut self, _name: &str) -> Result<()> {
      let pending: Vec<_> = self.pending.drain(..).collect();
      self.stored.extend(pending);
      Ok(())
    }

    async fn commit(self) -> Result<()> {
      Ok(())
    }

    async fn rollback(self) -> Result<()> {
      Ok(())
    }
  }

  fn author() -> User {
    User {
      id: 1,
      username: "ana".to_string(),
      email: "ana@example.com".to_string(),
      created_at: NaiveDateTime::default(),
    }
  }

  fn article() -> Article {
    Article {
      id: 9,
      title: "Lifetimes".to_string(),
      content: "Lifetimes in depth".to_string(),
      status: ArticleStatus::Published,
      author_id: 1,
      category_id: 1,
      comments_count: 0,
      likes_count: 0,
      created_at: NaiveDateTime::default(),
      updated_at: NaiveDateTime::default(),
    }
  }

  #[tokio::test]
  async fn publish_pages_through_every_follower() {
    let mut sink = FlakySink {
      followers: (100..107).collect(),
      ..Default::default()
    };
    let fanout = NotificationFanout { page_size: 3 };
    assert_eq!(fanout.article_published(&mut sink, &article(), &author()).await, 7);
    assert_eq!(sink.batches, 3);
    assert_eq!(sink.stored.len(), 7);
    assert!(sink.stored.iter().all(|n| n.article_id == 9
      && n.message == "ana published a new article: Lifetimes"));
  }

  #[tokio::test]
  async fn failed_page_is_swallowed_and_rolled_back() {
    let mut sink = FlakySink {
      followers: (100..107).collect(),
      fail_on_batch: Some(2),
      ..Default::default()
    };
    let fanout = NotificationFanout { page_size: 3 };
    assert_eq!(fanout.article_published(&mut sink, &article(), &author()).await, 3);
    assert_eq!(sink.savepoint_rollbacks, 1);
    assert_eq!(sink.stored.iter().map(|n| n.recipient_id).collect::<Vec<_>>(), vec![100, 101, 102]);
  }

  #[tokio::test]
  async fn no_self_notifications() {
    let mut sink = FlakySink::default();
    let fanout = NotificationFanout::default();
    let me = author();
    assert_eq!(fanout.comment_added(&mut sink, &article(), &me).await, 0);
    let other = User { id: 2, ..author() };
    assert_eq!(fanout.comment_added(&mut sink, &article(), &other).await, 1);
    assert_eq!(sink.stored[0].recipient_id, 1);
    assert_eq!(sink.stored[0].message, "New comment on your article \"Lifetimes\"");
  }

  #[tokio::test]
  async fn failed_single_notification_returns_zero() {
    let mut sink = FlakySink {
      fail_on_batch: Some(1),
      ..Default::default()
    };
    let parent = Comment {
      id: 5,
      content: "first".to_string(),
      author_id: 3,
      article_id: 9,
      parent_id: None,
      created_at: NaiveDateTime::default(),
      updated_at: NaiveDateTime::default(),
    };
    let fanout = NotificationFanout::default();
    assert_eq!(fanout.reply_added(&mut sink, &article(), &parent, &author()).await, 0);
    assert!(sink.stored.is_empty());
  }
}

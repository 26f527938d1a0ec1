use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait NotificationRepository {
  /// Insert a batch in one round trip.  Returns the number stored.
  async fn insert_notifications(&mut self, batch: &[NewNotification]) -> Result<u64>;

  async fn find_notification(&mut self, id: NotificationId) -> Result<Option<Notification>>;

  /// Newest first.
  async fn list_notifications(&mut self, user: UserId, unread_only: bool, req: &PageRequest)
    -> Result<Page<Notification>>;

  async fn mark_read(&mut self, id: NotificationId) -> Result<bool>;

  async fn mark_all_read(&mut self, user: UserId) -> Result<u64>;

  async fn count_unread(&mut self, user: UserId) -> Result<i64>;
}

lazy_static! {
  static ref NOTIFICATION_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "notifications",
      columns: vec![
        primary("id"),
        column("recipient_id"),
        column("article_id"),
        column("message"),
        generated("is_read"),
        generated("created_at"),
      ],
    }
  };

  static ref NOTIFICATION_BY_ID: String =
    format!("{} WHERE id = $1", NOTIFICATION_COLUMNS.build_select_query());
  static ref LIST_NOTIFICATIONS: String = format!(
    r#"{} WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)
    ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"#,
    NOTIFICATION_COLUMNS.build_select_query());
}

static INSERT_NOTIFICATIONS: &str = r#"
INSERT INTO notifications(recipient_id, article_id, message)
SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::VARCHAR[])"#;

static COUNT_NOTIFICATIONS: &str = r#"
SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)"#;

fn notification_from_row(row: &Row) -> Notification {
  Notification {
    id: row.get(0),
    recipient_id: row.get(1),
    article_id: row.get(2),
    message: row.get(3),
    read: row.get(4),
    created_at: row.get(5),
  }
}

#[async_trait]
impl NotificationRepository for PgTx {
  async fn insert_notifications(&mut self, batch: &[NewNotification]) -> Result<u64> {
    if batch.is_empty() {
      return Ok(0);
    }
    let recipients: Vec<UserId> = batch.iter().map(|n| n.recipient_id).collect();
    let articles: Vec<ArticleId> = batch.iter().map(|n| n.article_id).collect();
    let messages: Vec<&str> = batch.iter().map(|n| n.message.as_str()).collect();
    self.execute(INSERT_NOTIFICATIONS, &[&recipients, &articles, &messages]).await
  }

  async fn find_notification(&mut self, id: NotificationId) -> Result<Option<Notification>> {
    let row = self.query_opt(&NOTIFICATION_BY_ID, &[&id]).await?;
    Ok(row.as_ref().map(notification_from_row))
  }

  async fn list_notifications(&mut self, user: UserId, unread_only: bool, req: &PageRequest)
    -> Result<Page<Notification>> {
    let rows = self.query(&LIST_NOTIFICATIONS,
      &[&user, &unread_only, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one(COUNT_NOTIFICATIONS, &[&user, &unread_only]).await?.get(0);
    Ok(page_of(rows.iter().map(notification_from_row).collect(), req, total))
  }

  async fn mark_read(&mut self, id: NotificationId) -> Result<bool> {
    let count = self.execute("UPDATE notifications SET is_read = TRUE WHERE id = $1", &[&id]).await?;
    Ok(count > 0)
  }

  async fn mark_all_read(&mut self, user: UserId) -> Result<u64> {
    self.execute("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
      &[&user]).await
  }

  async fn count_unread(&mut self, user: UserId) -> Result<i64> {
    let row = self.query_one(
      "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read", &[&user]).await?;
    Ok(row.get(0))
  }
}

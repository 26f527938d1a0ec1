use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::{ArticleId, NotificationId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: NotificationId,
  pub recipient_id: UserId,
  pub article_id: ArticleId,
  pub message: String,
  pub read: bool,
  pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
  pub recipient_id: UserId,
  pub article_id: ArticleId,
  pub message: String,
}

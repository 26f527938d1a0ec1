use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::{ArticleId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
  pub id: i64,
  pub user_id: UserId,
  pub article_id: ArticleId,
  pub created_at: NaiveDateTime,
}

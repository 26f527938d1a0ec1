use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
  pub id: i64,
  pub follower_id: UserId,
  pub following_id: UserId,
  pub created_at: NaiveDateTime,
}

use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: UserId,
  pub username: String,
  pub email: String,
  pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub user_id: UserId,
  pub username: String,
  pub followers_count: i64,
  pub following_count: i64,
  pub following: bool,
}

use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::CategoryId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: CategoryId,
  pub name: String,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::models::{ArticleId, CategoryId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[postgres(name = "article_status")]
pub enum ArticleStatus {
  #[postgres(name = "DRAFT")]
  Draft,
  #[postgres(name = "PUBLISHED")]
  Published,
}

impl ArticleStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ArticleStatus::Draft => "DRAFT",
      ArticleStatus::Published => "PUBLISHED",
    }
  }
}

impl fmt::Display for ArticleStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ArticleStatus {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self> {
    match raw.trim().to_uppercase().as_str() {
      "DRAFT" => Ok(ArticleStatus::Draft),
      "PUBLISHED" => Ok(ArticleStatus::Published),
      _ => Err(Error::invalid("status", format!("invalid status: {}", raw))),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
  pub id: ArticleId,
  pub title: String,
  pub content: String,
  pub status: ArticleStatus,
  pub author_id: UserId,
  pub category_id: CategoryId,
  pub comments_count: i64,
  pub likes_count: i64,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

impl Article {
  pub fn is_published(&self) -> bool {
    self.status == ArticleStatus::Published
  }

  pub fn is_authored_by(&self, user_id: UserId) -> bool {
    self.author_id == user_id
  }
}

/// Insert record; counters start at zero and timestamps come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
  pub title: String,
  pub content: String,
  pub status: ArticleStatus,
  pub author_id: UserId,
  pub category_id: CategoryId,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_parsing_is_case_insensitive() {
    assert_eq!(" published ".parse::<ArticleStatus>().ok(), Some(ArticleStatus::Published));
    assert_eq!("Draft".parse::<ArticleStatus>().ok(), Some(ArticleStatus::Draft));
  }

  #[test]
  fn unknown_status_is_a_validation_error() {
    match "ARCHIVED".parse::<ArticleStatus>() {
      Err(Error::Validation(fields)) => assert_eq!(fields[0].field, "status"),
      other => panic!("unexpected: {:?}", other),
    }
  }
}

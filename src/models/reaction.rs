use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::models::{ArticleId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[postgres(name = "reaction_type")]
pub enum ReactionType {
  #[postgres(name = "LIKE")]
  Like,
  #[postgres(name = "LOVE")]
  Love,
  #[postgres(name = "LAUGH")]
  Laugh,
  #[postgres(name = "WOW")]
  Wow,
  #[postgres(name = "SAD")]
  Sad,
  #[postgres(name = "ANGRY")]
  Angry,
}

impl ReactionType {
  pub const ALL: [ReactionType; 6] = [
    ReactionType::Like,
    ReactionType::Love,
    ReactionType::Laugh,
    ReactionType::Wow,
    ReactionType::Sad,
    ReactionType::Angry,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ReactionType::Like => "LIKE",
      ReactionType::Love => "LOVE",
      ReactionType::Laugh => "LAUGH",
      ReactionType::Wow => "WOW",
      ReactionType::Sad => "SAD",
      ReactionType::Angry => "ANGRY",
    }
  }

  pub fn is_like(&self) -> bool {
    *self == ReactionType::Like
  }
}

impl fmt::Display for ReactionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReactionType {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self> {
    let upper = raw.trim().to_uppercase();
    ReactionType::ALL.iter()
      .find(|t| t.as_str() == upper)
      .copied()
      .ok_or_else(|| Error::invalid("type", format!("invalid reaction type: {}", raw)))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
  pub id: i64,
  #[serde(rename = "type")]
  pub reaction_type: ReactionType,
  pub user_id: UserId,
  pub article_id: ArticleId,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionStats {
  pub article_id: ArticleId,
  pub total_reactions: i64,
  /// Only types with at least one reaction are listed.
  pub reactions_by_type: BTreeMap<ReactionType, i64>,
  pub user_reaction: Option<ReactionType>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_reaction_type() {
    assert_eq!("like".parse::<ReactionType>().ok(), Some(ReactionType::Like));
    assert_eq!(" Angry ".parse::<ReactionType>().ok(), Some(ReactionType::Angry));
    assert!("meh".parse::<ReactionType>().is_err());
  }
}

use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::{ArticleId, CommentId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: CommentId,
  pub content: String,
  pub author_id: UserId,
  pub article_id: ArticleId,
  pub parent_id: Option<CommentId>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
  pub content: String,
  pub author_id: UserId,
  pub article_id: ArticleId,
  pub parent_id: Option<CommentId>,
}

/// A comment with its replies, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadedComment {
  pub id: CommentId,
  pub content: String,
  pub author_id: UserId,
  pub article_id: ArticleId,
  pub parent_id: Option<CommentId>,
  pub created_at: NaiveDateTime,
  pub replies: Vec<ThreadedComment>,
}

impl ThreadedComment {
  pub fn leaf(comment: &Comment) -> Self {
    Self {
      id: comment.id,
      content: comment.content.clone(),
      author_id: comment.author_id,
      article_id: comment.article_id,
      parent_id: comment.parent_id,
      created_at: comment.created_at,
      replies: Vec::new(),
    }
  }

  /// Number of comments in this subtree, including itself.
  pub fn count(&self) -> usize {
    1 + self.replies.iter().map(|r| r.count()).sum::<usize>()
  }

  pub fn depth(&self) -> usize {
    self.replies.iter().map(|r| r.depth() + 1).max().unwrap_or(0)
  }
}

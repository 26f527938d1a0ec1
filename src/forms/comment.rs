use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::Checks;
use crate::models::CommentId;

pub const COMMENT_MAX: usize = 5000;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
  pub content: String,
  pub parent_id: Option<CommentId>,
}

impl CreateComment {
  pub fn new(content: &str) -> Self {
    Self {
      content: content.to_string(),
      parent_id: None,
    }
  }

  pub fn reply(content: &str, parent_id: CommentId) -> Self {
    Self {
      content: content.to_string(),
      parent_id: Some(parent_id),
    }
  }

  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if checks.required("content", &self.content) {
      checks.length("content", &self.content, 1, Some(COMMENT_MAX));
    }
    checks.finish()
  }
}

use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::Checks;
use crate::util::non_blank;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 200;
pub const CONTENT_MIN: usize = 10;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateArticle {
  pub title: String,
  pub content: String,
  pub category: String,
  pub status: String,
}

impl CreateArticle {
  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if checks.required("title", &self.title) {
      checks.length("title", &self.title, TITLE_MIN, Some(TITLE_MAX));
    }
    if checks.required("content", &self.content) {
      checks.length("content", &self.content, CONTENT_MIN, None);
    }
    checks.required("category", &self.category);
    checks.required("status", &self.status);
    checks.finish()
  }
}

/// Partial update.  `None` and blank strings both mean "leave unchanged".
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateArticle {
  pub title: Option<String>,
  pub content: Option<String>,
  pub category: Option<String>,
  pub status: Option<String>,
}

impl UpdateArticle {
  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(title) = non_blank(&self.title) {
      checks.length("title", title, TITLE_MIN, Some(TITLE_MAX));
    }
    if let Some(content) = non_blank(&self.content) {
      checks.length("content", content, CONTENT_MIN, None);
    }
    checks.finish()
  }

  pub fn title(&self) -> Option<&str> {
    non_blank(&self.title)
  }

  pub fn content(&self) -> Option<&str> {
    non_blank(&self.content)
  }

  pub fn category(&self) -> Option<&str> {
    non_blank(&self.category)
  }

  pub fn status(&self) -> Option<&str> {
    non_blank(&self.status)
  }
}

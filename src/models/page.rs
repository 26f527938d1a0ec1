use serde::{Deserialize, Serialize};

use crate::forms::PageRequest;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub size: u32,
  pub total: u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, req: &PageRequest, total: u64) -> Self {
    Self {
      items,
      page: req.page,
      size: req.size,
      total,
    }
  }

  pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
    Page {
      items: self.items.into_iter().map(f).collect(),
      page: self.page,
      size: self.size,
      total: self.total,
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

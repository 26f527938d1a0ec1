use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: 0,
      size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl PageRequest {
  pub fn new(page: u32, size: u32) -> Self {
    Self { page, size }
  }

  /// Clamp the size into `1..=max`.
  pub fn clamped(self, max: u32) -> Self {
    Self {
      page: self.page,
      size: self.size.max(1).min(max.max(1)),
    }
  }

  pub fn limit(&self) -> i64 {
    self.size as i64
  }

  pub fn offset(&self) -> i64 {
    self.page as i64 * self.size as i64
  }

  /// Apply this page to an already ordered slice.
  pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
    items.iter()
      .skip(self.offset() as usize)
      .take(self.size as usize)
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clamps_and_slices() {
    let req = PageRequest::new(1, 500).clamped(MAX_PAGE_SIZE);
    assert_eq!(req.size, MAX_PAGE_SIZE);
    assert_eq!(req.offset(), 100);

    let req = PageRequest::new(1, 2);
    assert_eq!(req.slice(&[1, 2, 3, 4, 5]), vec![3, 4]);
    assert_eq!(PageRequest::new(0, 0).clamped(10).size, 1);
  }
}

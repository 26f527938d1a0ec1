use crate::error::*;
use crate::util::char_len;

pub mod user;
pub mod article;
pub mod comment;
pub mod category;
pub mod page;
pub use self::{
  user::*,
  article::*,
  comment::*,
  category::*,
  page::*,
};

/// Collects every failing field before reporting.
#[derive(Debug, Default)]
pub struct Checks {
  errors: Vec<FieldError>,
}

impl Checks {
  pub fn new() -> Self {
    Default::default()
  }

  /// Fails when `val` is blank.  Returns whether the value is present.
  pub fn required(&mut self, field: &'static str, val: &str) -> bool {
    if val.trim().is_empty() {
      self.errors.push(FieldError::new(field, "must not be blank"));
      false
    } else {
      true
    }
  }

  pub fn length(&mut self, field: &'static str, val: &str, min: usize, max: Option<usize>) {
    let len = char_len(val.trim());
    if len < min {
      self.errors.push(FieldError::new(field, format!("must have at least {} characters", min)));
    } else if let Some(max) = max {
      if len > max {
        self.errors.push(FieldError::new(field, format!("must have at most {} characters", max)));
      }
    }
  }

  pub fn check(&mut self, field: &'static str, ok: bool, message: &str) {
    if !ok {
      self.errors.push(FieldError::new(field, message));
    }
  }

  pub fn finish(self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(self.errors))
    }
  }
}

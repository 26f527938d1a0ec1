use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::Checks;

pub const CATEGORY_NAME_MAX: usize = 60;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryName {
  pub name: String,
}

impl CategoryName {
  pub fn new(name: &str) -> Self {
    Self { name: name.to_string() }
  }

  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if checks.required("name", &self.name) {
      checks.length("name", &self.name, 1, Some(CATEGORY_NAME_MAX));
    }
    checks.finish()
  }
}

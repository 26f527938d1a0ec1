use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::Checks;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterUser {
  pub username: String,
  pub email: String,
}

impl RegisterUser {
  pub fn new(username: &str, email: &str) -> Self {
    Self {
      username: username.to_string(),
      email: email.to_string(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if checks.required("username", &self.username) {
      checks.length("username", &self.username, 1, Some(100));
    }
    if checks.required("email", &self.email) {
      checks.length("email", &self.email, 3, Some(120));
      checks.check("email", self.email.contains('@'), "must be an email address");
    }
    checks.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn register_requires_an_email_address() {
    assert!(RegisterUser::new("ana", "ana@example.com").validate().is_ok());
    match RegisterUser::new("", "nope").validate() {
      Err(Error::Validation(errors)) => {
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "email"]);
      },
      other => panic!("unexpected: {:?}", other),
    }
  }
}

use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::RegisterUser;
use crate::models::*;

use super::{traced, Service};

#[derive(Clone)]
pub struct UserService<S: Store> {
  store: S,
}

impl<S: Store> UserService<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub async fn register(&self, form: &RegisterUser) -> Result<User> {
    traced("user.register", async {
      form.validate()?;
      let mut tx = self.store.begin().await?;
      let res = tx.insert_user(form.username.trim(), form.email.trim()).await
        .map_err(|err| match err {
          Error::Conflict(constraint) if constraint.contains("email") => {
            Error::conflict("email already registered")
          },
          Error::Conflict(_) => Error::conflict("username already taken"),
          err => err,
        });
      let user = finish(tx, res).await?;
      info!("user {}: registered {}", user.id, user.username);
      Ok(user)
    }).await
  }

  pub async fn find(&self, id: UserId) -> Result<User> {
    traced("user.find", async {
      let mut tx = self.store.begin().await?;
      let res = tx.find_user(id).await
        .and_then(|found| found.ok_or_else(|| Error::not_found(format!("user {}", id))));
      finish(tx, res).await
    }).await
  }
}

impl<S: Store> Service for UserService<S> {
  fn load_app_config(&mut self, _config: &AppConfig) -> Result<()> {
    Ok(())
  }
}

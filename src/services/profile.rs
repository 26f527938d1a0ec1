use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::PageRequest;
use crate::models::*;

use super::{traced, Paging, Service};

/// Follow graph between users.
#[derive(Clone)]
pub struct ProfileService<S: Store> {
  store: S,
  paging: Paging,
}

async fn require_user<R: UserRepository>(tx: &mut R, id: UserId) -> Result<User> {
  tx.find_user(id).await?
    .ok_or_else(|| Error::not_found(format!("user {}", id)))
}

impl<S: Store> ProfileService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      paging: Default::default(),
    }
  }

  pub async fn follow(&self, target: UserId, user: &User) -> Result<Follow> {
    traced("profile.follow", async {
      if target == user.id {
        return Err(Error::business("you cannot follow yourself"));
      }
      let mut tx = self.store.begin().await?;
      let res = self.follow_in(&mut tx, target, user).await;
      finish(tx, res).await
    }).await
  }

  async fn follow_in(&self, tx: &mut S::Tx, target: UserId, user: &User) -> Result<Follow> {
    let target = require_user(tx, target).await?;
    if tx.find_follow(user.id, target.id).await?.is_some() {
      return Err(Error::conflict(format!("already following {}", target.username)));
    }
    let follow = tx.insert_follow(user.id, target.id).await
      .map_err(|err| match err {
        Error::Conflict(_) => Error::conflict(format!("already following {}", target.username)),
        err => err,
      })?;
    debug!("{} now follows {}", user.username, target.username);
    Ok(follow)
  }

  pub async fn unfollow(&self, target: UserId, user: &User) -> Result<()> {
    traced("profile.unfollow", async {
      let mut tx = self.store.begin().await?;
      let res = match tx.delete_follow(user.id, target).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::not_found(format!("not following user {}", target))),
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  pub async fn followers(&self, target: UserId, req: &PageRequest) -> Result<Page<User>> {
    traced("profile.followers", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = match require_user(&mut tx, target).await {
        Ok(_) => tx.list_followers(target, &req).await,
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  pub async fn following(&self, target: UserId, req: &PageRequest) -> Result<Page<User>> {
    traced("profile.following", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = match require_user(&mut tx, target).await {
        Ok(_) => tx.list_following(target, &req).await,
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  pub async fn profile(&self, target: UserId, viewer: Option<&User>) -> Result<Profile> {
    traced("profile.profile", async {
      let mut tx = self.store.begin().await?;
      let res = self.profile_in(&mut tx, target, viewer).await;
      finish(tx, res).await
    }).await
  }

  async fn profile_in(&self, tx: &mut S::Tx, target: UserId, viewer: Option<&User>)
    -> Result<Profile> {
    let user = require_user(tx, target).await?;
    let following = match viewer {
      Some(viewer) => tx.find_follow(viewer.id, user.id).await?.is_some(),
      None => false,
    };
    Ok(Profile {
      user_id: user.id,
      followers_count: tx.count_followers(user.id).await?,
      following_count: tx.count_following(user.id).await?,
      username: user.username,
      following,
    })
  }

  pub async fn is_following(&self, target: UserId, user: &User) -> Result<bool> {
    traced("profile.is_following", async {
      let mut tx = self.store.begin().await?;
      let res = match require_user(&mut tx, target).await {
        Ok(_) => tx.find_follow(user.id, target).await.map(|found| found.is_some()),
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }
}

impl<S: Store> Service for ProfileService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.paging.load_app_config(config)
  }
}

use log::*;

use std::future::Future;
use std::time::Instant;

use crate::error::*;
use crate::app::*;
use crate::db::Store;
use crate::forms::{PageRequest, MAX_PAGE_SIZE};

mod user;
mod category;
mod counter;
mod thread;
mod fanout;
mod article;
mod comment;
mod reaction;
mod favorite;
mod profile;
mod notification;
pub use self::{
  user::*,
  category::*,
  counter::*,
  thread::*,
  fanout::*,
  article::*,
  comment::*,
  reaction::*,
  favorite::*,
  profile::*,
  notification::*,
};

pub trait Service {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()>;
}

/// Log one service call: start, outcome and elapsed time.
pub async fn traced<T, F>(name: &'static str, fut: F) -> Result<T>
where
  F: Future<Output = Result<T>>,
{
  let start = Instant::now();
  debug!("{}: start", name);
  let res = fut.await;
  match &res {
    Ok(_) => debug!("{}: ok in {:?}", name, start.elapsed()),
    Err(err) if err.is_domain() => info!("{}: {}", name, err),
    Err(err) => warn!("{}: failed after {:?}: {:?}", name, start.elapsed(), err),
  }
  res
}

/// Upper bound on requested page sizes.
#[derive(Debug, Clone, Copy)]
pub struct Paging {
  pub max_size: u32,
}

impl Default for Paging {
  fn default() -> Self {
    Self {
      max_size: MAX_PAGE_SIZE,
    }
  }
}

impl Paging {
  pub fn clamp(&self, req: &PageRequest) -> PageRequest {
    req.clamped(self.max_size)
  }
}

impl Service for Paging {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.max_size = config.get_positive("page.max_size", MAX_PAGE_SIZE as i64)? as u32;
    Ok(())
  }
}

/// Every service over one shared store.
#[derive(Clone)]
pub struct Services<S: Store> {
  pub users: UserService<S>,
  pub categories: CategoryService<S>,
  pub articles: ArticleService<S>,
  pub comments: CommentService<S>,
  pub reactions: ReactionService<S>,
  pub favorites: FavoriteService<S>,
  pub profiles: ProfileService<S>,
  pub notifications: NotificationService<S>,
}

impl<S: Store> Services<S> {
  /// Services with default settings.
  pub fn new(store: S) -> Self {
    Self {
      users: UserService::new(store.clone()),
      categories: CategoryService::new(store.clone()),
      articles: ArticleService::new(store.clone()),
      comments: CommentService::new(store.clone()),
      reactions: ReactionService::new(store.clone()),
      favorites: FavoriteService::new(store.clone()),
      profiles: ProfileService::new(store.clone()),
      notifications: NotificationService::new(store),
    }
  }

  pub fn from_app_config(store: S, config: &AppConfig) -> Result<Self> {
    let mut services = Self::new(store);
    services.load_app_config(config)?;
    Ok(services)
  }
}

impl<S: Store> Service for Services<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    info!("Loading service config");
    self.users.load_app_config(config)?;
    self.categories.load_app_config(config)?;
    self.articles.load_app_config(config)?;
    self.comments.load_app_config(config)?;
    self.reactions.load_app_config(config)?;
    self.favorites.load_app_config(config)?;
    self.profiles.load_app_config(config)?;
    self.notifications.load_app_config(config)?;
    Ok(())
  }
}

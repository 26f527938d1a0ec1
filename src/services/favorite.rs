use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::PageRequest;
use crate::models::*;

use super::{traced, Paging, Service};

#[derive(Clone)]
pub struct FavoriteService<S: Store> {
  store: S,
  paging: Paging,
}

impl<S: Store> FavoriteService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      paging: Default::default(),
    }
  }

  pub async fn add(&self, article: ArticleId, user: &User) -> Result<Favorite> {
    traced("favorite.add", async {
      let mut tx = self.store.begin().await?;
      let res = self.add_in(&mut tx, article, user).await;
      finish(tx, res).await
    }).await
  }

  async fn add_in(&self, tx: &mut S::Tx, article_id: ArticleId, user: &User) -> Result<Favorite> {
    let article = tx.find_article(article_id).await?
      .ok_or_else(|| Error::not_found(format!("article {}", article_id)))?;
    if !article.is_published() {
      return Err(Error::business("only published articles can be favorited"));
    }
    if tx.find_favorite(user.id, article.id).await?.is_some() {
      return Err(Error::conflict("article already in favorites"));
    }
    tx.insert_favorite(user.id, article.id).await
      .map_err(|err| match err {
        Error::Conflict(_) => Error::conflict("article already in favorites"),
        err => err,
      })
  }

  pub async fn remove(&self, article: ArticleId, user: &User) -> Result<()> {
    traced("favorite.remove", async {
      let mut tx = self.store.begin().await?;
      let res = match tx.delete_favorite(user.id, article).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::not_found(format!("favorite for article {}", article))),
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  /// Favorited articles that are currently published.
  pub async fn list(&self, user: &User, req: &PageRequest) -> Result<Page<Article>> {
    traced("favorite.list", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = tx.list_favorite_articles(user.id, &req).await;
      finish(tx, res).await
    }).await
  }

  pub async fn is_favorite(&self, article: ArticleId, user: &User) -> Result<bool> {
    traced("favorite.is_favorite", async {
      let mut tx = self.store.begin().await?;
      let res = tx.find_favorite(user.id, article).await.map(|found| found.is_some());
      finish(tx, res).await
    }).await
  }
}

impl<S: Store> Service for FavoriteService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.paging.load_app_config(config)
  }
}

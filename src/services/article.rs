use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::{CreateArticle, PageRequest, UpdateArticle};
use crate::models::*;

use super::{traced, CategoryResolver, NotificationFanout, Paging, Service};

/// Article state machine: DRAFT -> PUBLISHED, never back.
#[derive(Clone)]
pub struct ArticleService<S: Store> {
  store: S,
  resolver: CategoryResolver,
  fanout: NotificationFanout,
  paging: Paging,
}

fn title_conflict(title: &str) -> Error {
  Error::conflict(format!("you already have an article titled \"{}\"", title))
}

impl<S: Store> ArticleService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      resolver: Default::default(),
      fanout: Default::default(),
      paging: Default::default(),
    }
  }

  pub async fn create(&self, form: &CreateArticle, author: &User) -> Result<Article> {
    traced("article.create", async {
      form.validate()?;
      let status: ArticleStatus = form.status.parse()?;
      let mut tx = self.store.begin().await?;
      let res = self.create_in(&mut tx, form, status, author).await;
      finish(tx, res).await
    }).await
  }

  async fn create_in(&self, tx: &mut S::Tx, form: &CreateArticle, status: ArticleStatus,
      author: &User) -> Result<Article> {
    let title = form.title.trim();
    if tx.article_title_taken(author.id, title, None).await? {
      return Err(title_conflict(title));
    }
    let category = self.resolver.resolve(tx, &form.category).await?;
    let article = tx.insert_article(&NewArticle {
      title: title.to_string(),
      content: form.content.trim().to_string(),
      status,
      author_id: author.id,
      category_id: category.id,
    }).await
      .map_err(|err| match err {
        Error::Conflict(_) => title_conflict(title),
        err => err,
      })?;
    info!("article {}: created by {} as {}", article.id, author.username, article.status);

    if article.is_published() {
      self.fanout.article_published(tx, &article, author).await;
    }
    Ok(article)
  }

  /// Apply the non-blank fields of `patch`.
  pub async fn update(&self, id: ArticleId, patch: &UpdateArticle, user: &User) -> Result<Article> {
    traced("article.update", async {
      patch.validate()?;
      let status = patch.status().map(str::parse::<ArticleStatus>).transpose()?;
      let mut tx = self.store.begin().await?;
      let res = self.update_in(&mut tx, id, patch, status, user).await;
      finish(tx, res).await
    }).await
  }

  async fn update_in(&self, tx: &mut S::Tx, id: ArticleId, patch: &UpdateArticle,
      status: Option<ArticleStatus>, user: &User) -> Result<Article> {
    let mut article = tx.find_article(id).await?
      .ok_or_else(|| Error::not_found(format!("article {}", id)))?;
    if !article.is_authored_by(user.id) {
      return Err(Error::forbidden("only the author can edit this article"));
    }
    let was_published = article.is_published();

    if let Some(status) = status {
      if was_published && status == ArticleStatus::Draft {
        return Err(Error::business("a published article cannot go back to draft"));
      }
      article.status = status;
    }
    if let Some(title) = patch.title() {
      if title != article.title {
        if tx.article_title_taken(user.id, title, Some(id)).await? {
          return Err(title_conflict(title));
        }
        article.title = title.to_string();
      }
    }
    if let Some(content) = patch.content() {
      article.content = content.to_string();
    }
    if let Some(category) = patch.category() {
      article.category_id = self.resolver.resolve(tx, category).await?.id;
    }

    let article = tx.save_article(&article).await
      .map_err(|err| match err {
        Error::Conflict(_) => title_conflict(&article.title),
        err => err,
      })?;

    if !was_published && article.is_published() {
      info!("article {}: published", article.id);
      self.fanout.article_published(tx, &article, user).await;
    }
    Ok(article)
  }

  /// Delete an article; comments, reactions, favorites and notifications go with it.
  pub async fn delete(&self, id: ArticleId, user: &User) -> Result<()> {
    traced("article.delete", async {
      let mut tx = self.store.begin().await?;
      let res = self.delete_in(&mut tx, id, user).await;
      finish(tx, res).await
    }).await
  }

  async fn delete_in(&self, tx: &mut S::Tx, id: ArticleId, user: &User) -> Result<()> {
    let article = tx.find_article(id).await?
      .ok_or_else(|| Error::not_found(format!("article {}", id)))?;
    if !article.is_authored_by(user.id) {
      return Err(Error::forbidden("only the author can delete this article"));
    }
    if !tx.delete_article(id).await? {
      return Err(Error::not_found(format!("article {}", id)));
    }
    info!("article {}: deleted by {}", id, user.username);
    Ok(())
  }

  /// Published articles are public; drafts are only visible to their author.
  pub async fn find_by_id(&self, id: ArticleId, viewer: Option<&User>) -> Result<Article> {
    traced("article.find_by_id", async {
      let mut tx = self.store.begin().await?;
      let res = find_visible(&mut tx, id, viewer).await;
      finish(tx, res).await
    }).await
  }

  pub async fn list_published(&self, req: &PageRequest) -> Result<Page<Article>> {
    traced("article.list_published", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = tx.list_articles(ArticleStatus::Published, None, &req).await;
      finish(tx, res).await
    }).await
  }

  pub async fn list_drafts(&self, user: &User, req: &PageRequest) -> Result<Page<Article>> {
    traced("article.list_drafts", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = tx.list_articles(ArticleStatus::Draft, Some(user.id), &req).await;
      finish(tx, res).await
    }).await
  }
}

/// Load an article as `viewer` may see it.  Other people's drafts are `NotFound`.
pub(crate) async fn find_visible<R>(tx: &mut R, id: ArticleId, viewer: Option<&User>)
  -> Result<Article>
where
  R: ArticleRepository,
{
  match tx.find_article(id).await? {
    Some(article) if article.is_published() => Ok(article),
    Some(article) if viewer.map_or(false, |v| article.is_authored_by(v.id)) => Ok(article),
    _ => Err(Error::not_found(format!("article {}", id))),
  }
}

impl<S: Store> Service for ArticleService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.resolver.load_app_config(config)?;
    self.fanout.load_app_config(config)?;
    self.paging.load_app_config(config)?;
    Ok(())
  }
}

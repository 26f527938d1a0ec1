use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::{CreateComment, PageRequest};
use crate::models::*;

use super::article::find_visible;
use super::{traced, CounterMaintainer, NotificationFanout, Paging, Service, ThreadBuilder};

#[derive(Clone)]
pub struct CommentService<S: Store> {
  store: S,
  counters: CounterMaintainer,
  fanout: NotificationFanout,
  threads: ThreadBuilder,
  paging: Paging,
}

impl<S: Store> CommentService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      counters: Default::default(),
      fanout: Default::default(),
      threads: Default::default(),
      paging: Default::default(),
    }
  }

  /// Add a comment, or a reply when `form.parent_id` is set.
  pub async fn create(&self, article: ArticleId, form: &CreateComment, author: &User)
    -> Result<Comment> {
    traced("comment.create", async {
      form.validate()?;
      let mut tx = self.store.begin().await?;
      let res = self.create_in(&mut tx, article, form, author).await;
      finish(tx, res).await
    }).await
  }

  async fn create_in(&self, tx: &mut S::Tx, article_id: ArticleId, form: &CreateComment,
      author: &User) -> Result<Comment> {
    let article = find_visible(tx, article_id, Some(author)).await?;
    let parent = match form.parent_id {
      Some(parent_id) => {
        let parent = tx.find_comment(parent_id).await?
          .ok_or_else(|| Error::not_found(format!("comment {}", parent_id)))?;
        if parent.article_id != article.id {
          return Err(Error::forbidden("the parent comment belongs to another article"));
        }
        Some(parent)
      },
      None => None,
    };

    let comment = tx.insert_comment(&NewComment {
      content: form.content.trim().to_string(),
      author_id: author.id,
      article_id: article.id,
      parent_id: parent.as_ref().map(|p| p.id),
    }).await?;
    self.counters.comment_added(tx, article.id).await?;
    debug!("comment {}: added to article {}", comment.id, article.id);

    match parent {
      Some(parent) => self.fanout.reply_added(tx, &article, &parent, author).await,
      None => self.fanout.comment_added(tx, &article, author).await,
    };
    Ok(comment)
  }

  /// The comment's author or the article's author may delete it.  Replies go
  /// with it.
  pub async fn delete(&self, id: CommentId, user: &User) -> Result<()> {
    traced("comment.delete", async {
      let mut tx = self.store.begin().await?;
      let res = self.delete_in(&mut tx, id, user).await;
      finish(tx, res).await
    }).await
  }

  async fn delete_in(&self, tx: &mut S::Tx, id: CommentId, user: &User) -> Result<()> {
    let comment = tx.find_comment(id).await?
      .ok_or_else(|| Error::not_found(format!("comment {}", id)))?;
    let article = tx.find_article(comment.article_id).await?
      .ok_or_else(|| Error::not_found(format!("article {}", comment.article_id)))?;
    if comment.author_id != user.id && !article.is_authored_by(user.id) {
      return Err(Error::forbidden("only the comment or article author can delete this comment"));
    }
    let removed = tx.delete_comment(id).await?;
    let count = self.counters.comments_removed(tx, article.id).await?;
    info!("comment {}: deleted with {} replies, article {} now has {}",
      id, removed.saturating_sub(1), article.id, count);
    Ok(())
  }

  /// All comments of an article, oldest first.
  pub async fn list_flat(&self, article: ArticleId, viewer: Option<&User>, req: &PageRequest)
    -> Result<Page<Comment>> {
    traced("comment.list_flat", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = match find_visible(&mut tx, article, viewer).await {
        Ok(_) => tx.list_comments(article, &req).await,
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  /// Root comments, oldest first, each with its reply tree.  Pages count roots.
  pub async fn list_threaded(&self, article: ArticleId, viewer: Option<&User>, req: &PageRequest)
    -> Result<Page<ThreadedComment>> {
    traced("comment.list_threaded", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = self.list_threaded_in(&mut tx, article, viewer, &req).await;
      finish(tx, res).await
    }).await
  }

  async fn list_threaded_in(&self, tx: &mut S::Tx, article: ArticleId, viewer: Option<&User>,
      req: &PageRequest) -> Result<Page<ThreadedComment>> {
    find_visible(tx, article, viewer).await?;
    let roots = tx.list_root_comments(article, req).await?;
    if roots.is_empty() {
      return Ok(Page::new(Vec::new(), req, roots.total));
    }
    let comments = tx.all_comments(article).await?;
    let trees = self.threads.build(&roots.items, &comments);
    Ok(Page::new(trees, req, roots.total))
  }
}

impl<S: Store> Service for CommentService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.fanout.load_app_config(config)?;
    self.threads.load_app_config(config)?;
    self.paging.load_app_config(config)?;
    Ok(())
  }
}

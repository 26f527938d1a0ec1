use log::*;

use std::collections::BTreeMap;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::PageRequest;
use crate::models::*;

use super::{traced, CounterMaintainer, Paging, Service};

/// One reaction per user and article; a second one replaces the type.
#[derive(Clone)]
pub struct ReactionService<S: Store> {
  store: S,
  counters: CounterMaintainer,
  paging: Paging,
}

impl<S: Store> ReactionService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      counters: Default::default(),
      paging: Default::default(),
    }
  }

  pub async fn add_or_update(&self, article: ArticleId, kind: ReactionType, user: &User)
    -> Result<Reaction> {
    traced("reaction.add_or_update", async {
      let mut tx = self.store.begin().await?;
      let res = self.add_or_update_in(&mut tx, article, kind, user).await;
      finish(tx, res).await
    }).await
  }

  async fn add_or_update_in(&self, tx: &mut S::Tx, article_id: ArticleId, kind: ReactionType,
      user: &User) -> Result<Reaction> {
    let article = tx.find_article(article_id).await?
      .ok_or_else(|| Error::not_found(format!("article {}", article_id)))?;
    if !article.is_published() {
      return Err(Error::business("reactions are only allowed on published articles"));
    }

    let (reaction, before) = match tx.find_reaction(user.id, article.id).await? {
      Some(existing) if existing.reaction_type == kind => return Ok(existing),
      Some(existing) => {
        let before = existing.reaction_type;
        let updated = tx.update_reaction(existing.id, kind).await?
          .ok_or_else(|| Error::not_found(format!("reaction {}", existing.id)))?;
        (updated, Some(before))
      },
      None => (tx.insert_reaction(user.id, article.id, kind).await?, None),
    };
    self.counters.reaction_changed(tx, article.id, before, Some(kind)).await?;
    debug!("article {}: {} reacted {}", article.id, user.username, kind);
    Ok(reaction)
  }

  pub async fn remove(&self, article: ArticleId, user: &User) -> Result<()> {
    traced("reaction.remove", async {
      let mut tx = self.store.begin().await?;
      let res = self.remove_in(&mut tx, article, user).await;
      finish(tx, res).await
    }).await
  }

  async fn remove_in(&self, tx: &mut S::Tx, article: ArticleId, user: &User) -> Result<()> {
    let reaction = tx.find_reaction(user.id, article).await?
      .ok_or_else(|| Error::not_found(format!("reaction on article {}", article)))?;
    tx.delete_reaction(reaction.id).await?;
    self.counters.reaction_changed(tx, article, Some(reaction.reaction_type), None).await?;
    Ok(())
  }

  pub async fn list_by_article(&self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Reaction>> {
    traced("reaction.list_by_article", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = match tx.find_article(article).await {
        Ok(Some(_)) => tx.list_reactions_by_article(article, &req).await,
        Ok(None) => Err(Error::not_found(format!("article {}", article))),
        Err(err) => Err(err),
      };
      finish(tx, res).await
    }).await
  }

  pub async fn list_by_user(&self, user: &User, req: &PageRequest) -> Result<Page<Reaction>> {
    traced("reaction.list_by_user", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = tx.list_reactions_by_user(user.id, &req).await;
      finish(tx, res).await
    }).await
  }

  /// Totals per type, plus `viewer`'s own reaction when given.
  pub async fn stats(&self, article: ArticleId, viewer: Option<&User>) -> Result<ReactionStats> {
    traced("reaction.stats", async {
      let mut tx = self.store.begin().await?;
      let res = self.stats_in(&mut tx, article, viewer).await;
      finish(tx, res).await
    }).await
  }

  async fn stats_in(&self, tx: &mut S::Tx, article: ArticleId, viewer: Option<&User>)
    -> Result<ReactionStats> {
    if tx.find_article(article).await?.is_none() {
      return Err(Error::not_found(format!("article {}", article)));
    }
    let counts = tx.count_reactions_by_type(article).await?;
    let user_reaction = match viewer {
      Some(viewer) => tx.find_reaction(viewer.id, article).await?.map(|r| r.reaction_type),
      None => None,
    };
    let reactions_by_type: BTreeMap<ReactionType, i64> = counts.into_iter()
      .filter(|(_, count)| *count > 0)
      .collect();
    Ok(ReactionStats {
      article_id: article,
      total_reactions: reactions_by_type.values().sum(),
      reactions_by_type,
      user_reaction,
    })
  }

  pub async fn user_reaction(&self, article: ArticleId, user: &User) -> Result<Option<ReactionType>> {
    traced("reaction.user_reaction", async {
      let mut tx = self.store.begin().await?;
      let res = tx.find_reaction(user.id, article).await
        .map(|found| found.map(|r| r.reaction_type));
      finish(tx, res).await
    }).await
  }
}

impl<S: Store> Service for ReactionService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.paging.load_app_config(config)
  }
}

use log::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;
use crate::util::now;

use super::*;

/// In-process store with the same constraint behaviour as the Postgres schema.
///
/// Transactions are serialized: `begin` takes the only lock and holds it until
/// the transaction ends.  Used by the test suite and for embedding without a
/// database.
#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Default::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  type Tx = MemoryTx;

  async fn begin(&self) -> Result<MemoryTx> {
    let guard = self.tables.clone().lock_owned().await;
    let begin = guard.clone();
    Ok(MemoryTx {
      guard,
      begin: Some(begin),
      savepoints: Vec::new(),
    })
  }
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
  last_id: i64,
  users: BTreeMap<UserId, User>,
  categories: BTreeMap<CategoryId, Category>,
  articles: BTreeMap<ArticleId, Article>,
  comments: BTreeMap<CommentId, Comment>,
  reactions: BTreeMap<i64, Reaction>,
  favorites: BTreeMap<i64, Favorite>,
  follows: BTreeMap<i64, Follow>,
  notifications: BTreeMap<NotificationId, Notification>,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }

  fn require_user(&self, id: UserId, constraint: &str) -> Result<()> {
    if self.users.contains_key(&id) {
      Ok(())
    } else {
      Err(Error::IntegrityViolation(constraint.to_string()))
    }
  }

  fn require_article(&self, id: ArticleId, constraint: &str) -> Result<()> {
    if self.articles.contains_key(&id) {
      Ok(())
    } else {
      Err(Error::IntegrityViolation(constraint.to_string()))
    }
  }

  fn title_taken(&self, author: UserId, title: &str, except: Option<ArticleId>) -> bool {
    let title = title.to_lowercase();
    self.articles.values().any(|a| {
      a.author_id == author && a.title.to_lowercase() == title && Some(a.id) != except
    })
  }

  fn check_article(&self, author: UserId, title: &str, category: CategoryId,
      except: Option<ArticleId>) -> Result<()> {
    self.require_user(author, "articles_author_id_fkey")?;
    if !self.categories.contains_key(&category) {
      return Err(Error::IntegrityViolation("articles_category_id_fkey".to_string()));
    }
    if self.title_taken(author, title, except) {
      return Err(Error::conflict("uk_article_author_title"));
    }
    Ok(())
  }

  /// Ids of `root` and every reply below it.
  fn comment_subtree(&self, root: CommentId) -> Vec<CommentId> {
    let mut found = vec![root];
    let mut idx = 0;
    while idx < found.len() {
      let parent = found[idx];
      found.extend(self.comments.values()
        .filter(|c| c.parent_id == Some(parent))
        .map(|c| c.id));
      idx += 1;
    }
    found
  }
}

fn sorted_asc<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
  let mut items: Vec<T> = items.collect();
  items.sort_by_key(|item| key(item));
  items
}

fn sorted_desc<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
  let mut items = sorted_asc(items, key);
  items.reverse();
  items
}

fn paged<T: Clone>(items: Vec<T>, req: &PageRequest) -> Page<T> {
  Page::new(req.slice(&items), req, items.len() as u64)
}

/// Open memory transaction.  Dropping it without `commit` restores the state
/// seen at `begin`.
pub struct MemoryTx {
  guard: OwnedMutexGuard<Tables>,
  begin: Option<Tables>,
  savepoints: Vec<(String, Tables)>,
}

impl MemoryTx {
  fn tables(&mut self) -> &mut Tables {
    &mut self.guard
  }
}

impl Drop for MemoryTx {
  fn drop(&mut self) {
    if let Some(begin) = self.begin.take() {
      debug!("MemoryTx dropped while open, rolling back.");
      *self.guard = begin;
    }
  }
}

#[async_trait]
impl Transaction for MemoryTx {
  async fn savepoint(&mut self, name: &str) -> Result<()> {
    let snapshot = self.guard.clone();
    self.savepoints.push((name.to_string(), snapshot));
    Ok(())
  }

  async fn rollback_to(&mut self, name: &str) -> Result<()> {
    let snapshot = self.savepoints.iter()
      .rev()
      .find(|(sp, _)| sp == name)
      .map(|(_, tables)| tables.clone())
      .ok_or_else(|| anyhow::anyhow!("no such savepoint: {}", name))?;
    *self.guard = snapshot;
    Ok(())
  }

  async fn release(&mut self, name: &str) -> Result<()> {
    let pos = self.savepoints.iter()
      .rposition(|(sp, _)| sp == name)
      .ok_or_else(|| anyhow::anyhow!("no such savepoint: {}", name))?;
    self.savepoints.truncate(pos);
    Ok(())
  }

  async fn commit(mut self) -> Result<()> {
    self.begin = None;
    Ok(())
  }

  async fn rollback(mut self) -> Result<()> {
    if let Some(begin) = self.begin.take() {
      *self.guard = begin;
    }
    Ok(())
  }
}

#[async_trait]
impl UserRepository for MemoryTx {
  async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
    Ok(self.tables().users.get(&id).cloned())
  }

  async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
    Ok(self.tables().users.values().find(|u| u.username == username).cloned())
  }

  async fn insert_user(&mut self, username: &str, email: &str) -> Result<User> {
    let t = self.tables();
    if t.users.values().any(|u| u.username == username) {
      return Err(Error::conflict("uk_user_username"));
    }
    if t.users.values().any(|u| u.email == email) {
      return Err(Error::conflict("uk_user_email"));
    }
    let user = User {
      id: t.next_id(),
      username: username.to_string(),
      email: email.to_string(),
      created_at: now(),
    };
    t.users.insert(user.id, user.clone());
    Ok(user)
  }
}

#[async_trait]
impl CategoryRepository for MemoryTx {
  async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
    Ok(self.tables().categories.get(&id).cloned())
  }

  async fn find_category_by_name(&mut self, name: &str) -> Result<Option<Category>> {
    Ok(self.tables().categories.values().find(|c| c.name == name).cloned())
  }

  async fn insert_category(&mut self, name: &str) -> Result<Category> {
    let t = self.tables();
    if t.categories.values().any(|c| c.name == name) {
      return Err(Error::conflict("uk_category_name"));
    }
    let ts = now();
    let category = Category {
      id: t.next_id(),
      name: name.to_string(),
      created_at: ts,
      updated_at: ts,
    };
    t.categories.insert(category.id, category.clone());
    Ok(category)
  }

  async fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<Option<Category>> {
    let t = self.tables();
    if t.categories.values().any(|c| c.name == name && c.id != id) {
      return Err(Error::conflict("uk_category_name"));
    }
    Ok(t.categories.get_mut(&id).map(|c| {
      c.name = name.to_string();
      c.updated_at = now();
      c.clone()
    }))
  }

  async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
    let t = self.tables();
    if t.articles.values().any(|a| a.category_id == id) {
      return Err(Error::IntegrityViolation("articles_category_id_fkey".to_string()));
    }
    Ok(t.categories.remove(&id).is_some())
  }

  async fn list_categories(&mut self, req: &PageRequest) -> Result<Page<Category>> {
    let t = self.tables();
    let items = sorted_asc(t.categories.values().cloned(), |c| (c.name.clone(), c.id));
    Ok(paged(items, req))
  }
}

#[async_trait]
impl ArticleRepository for MemoryTx {
  async fn find_article(&mut self, id: ArticleId) -> Result<Option<Article>> {
    Ok(self.tables().articles.get(&id).cloned())
  }

  async fn article_title_taken(&mut self, author: UserId, title: &str, except: Option<ArticleId>)
    -> Result<bool> {
    Ok(self.tables().title_taken(author, title, except))
  }

  async fn insert_article(&mut self, article: &NewArticle) -> Result<Article> {
    let t = self.tables();
    t.check_article(article.author_id, &article.title, article.category_id, None)?;
    let ts = now();
    let article = Article {
      id: t.next_id(),
      title: article.title.clone(),
      content: article.content.clone(),
      status: article.status,
      author_id: article.author_id,
      category_id: article.category_id,
      comments_count: 0,
      likes_count: 0,
      created_at: ts,
      updated_at: ts,
    };
    t.articles.insert(article.id, article.clone());
    Ok(article)
  }

  async fn save_article(&mut self, article: &Article) -> Result<Article> {
    let t = self.tables();
    t.check_article(article.author_id, &article.title, article.category_id, Some(article.id))?;
    let stored = t.articles.get_mut(&article.id)
      .ok_or_else(|| Error::not_found(format!("article {}", article.id)))?;
    stored.title = article.title.clone();
    stored.content = article.content.clone();
    stored.status = article.status;
    stored.category_id = article.category_id;
    stored.updated_at = now();
    Ok(stored.clone())
  }

  async fn delete_article(&mut self, id: ArticleId) -> Result<bool> {
    let t = self.tables();
    if t.articles.remove(&id).is_none() {
      return Ok(false);
    }
    t.comments.retain(|_, c| c.article_id != id);
    t.reactions.retain(|_, r| r.article_id != id);
    t.favorites.retain(|_, f| f.article_id != id);
    t.notifications.retain(|_, n| n.article_id != id);
    Ok(true)
  }

  async fn list_articles(&mut self, status: ArticleStatus, author: Option<UserId>, req: &PageRequest)
    -> Result<Page<Article>> {
    let t = self.tables();
    let items = sorted_desc(
      t.articles.values()
        .filter(|a| a.status == status && author.map_or(true, |id| a.author_id == id))
        .cloned(),
      |a| (a.created_at, a.id));
    Ok(paged(items, req))
  }

  async fn reassign_category(&mut self, from: CategoryId, to: CategoryId) -> Result<u64> {
    let t = self.tables();
    if !t.categories.contains_key(&to) {
      return Err(Error::IntegrityViolation("articles_category_id_fkey".to_string()));
    }
    let mut moved = 0;
    for article in t.articles.values_mut().filter(|a| a.category_id == from) {
      article.category_id = to;
      moved += 1;
    }
    Ok(moved)
  }

  async fn adjust_comments_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>> {
    Ok(self.tables().articles.get_mut(&id).map(|a| {
      a.comments_count = (a.comments_count + delta).max(0);
      a.comments_count
    }))
  }

  async fn recount_comments(&mut self, id: ArticleId) -> Result<Option<i64>> {
    let t = self.tables();
    let count = t.comments.values().filter(|c| c.article_id == id).count() as i64;
    Ok(t.articles.get_mut(&id).map(|a| {
      a.comments_count = count;
      count
    }))
  }

  async fn adjust_likes_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>> {
    Ok(self.tables().articles.get_mut(&id).map(|a| {
      a.likes_count = (a.likes_count + delta).max(0);
      a.likes_count
    }))
  }
}

#[async_trait]
impl CommentRepository for MemoryTx {
  async fn find_comment(&mut self, id: CommentId) -> Result<Option<Comment>> {
    Ok(self.tables().comments.get(&id).cloned())
  }

  async fn insert_comment(&mut self, comment: &NewComment) -> Result<Comment> {
    let t = self.tables();
    t.require_user(comment.author_id, "comments_author_id_fkey")?;
    t.require_article(comment.article_id, "comments_article_id_fkey")?;
    if let Some(parent) = comment.parent_id {
      if !t.comments.contains_key(&parent) {
        return Err(Error::IntegrityViolation("comments_parent_id_fkey".to_string()));
      }
    }
    let ts = now();
    let comment = Comment {
      id: t.next_id(),
      content: comment.content.clone(),
      author_id: comment.author_id,
      article_id: comment.article_id,
      parent_id: comment.parent_id,
      created_at: ts,
      updated_at: ts,
    };
    t.comments.insert(comment.id, comment.clone());
    Ok(comment)
  }

  async fn delete_comment(&mut self, id: CommentId) -> Result<u64> {
    let t = self.tables();
    if !t.comments.contains_key(&id) {
      return Ok(0);
    }
    let doomed = t.comment_subtree(id);
    for id in doomed.iter() {
      t.comments.remove(id);
    }
    Ok(doomed.len() as u64)
  }

  async fn count_comments(&mut self, article: ArticleId) -> Result<i64> {
    Ok(self.tables().comments.values().filter(|c| c.article_id == article).count() as i64)
  }

  async fn list_comments(&mut self, article: ArticleId, req: &PageRequest) -> Result<Page<Comment>> {
    let items = self.all_comments(article).await?;
    Ok(paged(items, req))
  }

  async fn list_root_comments(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Comment>> {
    let items = self.all_comments(article).await?
      .into_iter()
      .filter(|c| c.parent_id.is_none())
      .collect();
    Ok(paged(items, req))
  }

  async fn all_comments(&mut self, article: ArticleId) -> Result<Vec<Comment>> {
    let t = self.tables();
    Ok(sorted_asc(
      t.comments.values().filter(|c| c.article_id == article).cloned(),
      |c| (c.created_at, c.id)))
  }
}

#[async_trait]
impl ReactionRepository for MemoryTx {
  async fn find_reaction(&mut self, user: UserId, article: ArticleId) -> Result<Option<Reaction>> {
    Ok(self.tables().reactions.values()
      .find(|r| r.user_id == user && r.article_id == article)
      .cloned())
  }

  async fn insert_reaction(&mut self, user: UserId, article: ArticleId, kind: ReactionType)
    -> Result<Reaction> {
    let t = self.tables();
    t.require_user(user, "reactions_user_id_fkey")?;
    t.require_article(article, "reactions_article_id_fkey")?;
    if t.reactions.values().any(|r| r.user_id == user && r.article_id == article) {
      return Err(Error::conflict("uk_user_article_reaction"));
    }
    let ts = now();
    let reaction = Reaction {
      id: t.next_id(),
      reaction_type: kind,
      user_id: user,
      article_id: article,
      created_at: ts,
      updated_at: ts,
    };
    t.reactions.insert(reaction.id, reaction.clone());
    Ok(reaction)
  }

  async fn update_reaction(&mut self, id: i64, kind: ReactionType) -> Result<Option<Reaction>> {
    Ok(self.tables().reactions.get_mut(&id).map(|r| {
      r.reaction_type = kind;
      r.updated_at = now();
      r.clone()
    }))
  }

  async fn delete_reaction(&mut self, id: i64) -> Result<bool> {
    Ok(self.tables().reactions.remove(&id).is_some())
  }

  async fn list_reactions_by_article(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Reaction>> {
    let t = self.tables();
    let items = sorted_desc(
      t.reactions.values().filter(|r| r.article_id == article).cloned(),
      |r| (r.created_at, r.id));
    Ok(paged(items, req))
  }

  async fn list_reactions_by_user(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Reaction>> {
    let t = self.tables();
    let items = sorted_desc(
      t.reactions.values().filter(|r| r.user_id == user).cloned(),
      |r| (r.created_at, r.id));
    Ok(paged(items, req))
  }

  async fn count_reactions_by_type(&mut self, article: ArticleId) -> Result<Vec<(ReactionType, i64)>> {
    let mut counts: BTreeMap<ReactionType, i64> = BTreeMap::new();
    for r in self.tables().reactions.values().filter(|r| r.article_id == article) {
      *counts.entry(r.reaction_type).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
  }
}

#[async_trait]
impl FavoriteRepository for MemoryTx {
  async fn find_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Option<Favorite>> {
    Ok(self.tables().favorites.values()
      .find(|f| f.user_id == user && f.article_id == article)
      .cloned())
  }

  async fn insert_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Favorite> {
    let t = self.tables();
    t.require_user(user, "favorites_user_id_fkey")?;
    t.require_article(article, "favorites_article_id_fkey")?;
    if t.favorites.values().any(|f| f.user_id == user && f.article_id == article) {
      return Err(Error::conflict("uk_user_article_favorite"));
    }
    let favorite = Favorite {
      id: t.next_id(),
      user_id: user,
      article_id: article,
      created_at: now(),
    };
    t.favorites.insert(favorite.id, favorite.clone());
    Ok(favorite)
  }

  async fn delete_favorite(&mut self, user: UserId, article: ArticleId) -> Result<bool> {
    let t = self.tables();
    let before = t.favorites.len();
    t.favorites.retain(|_, f| !(f.user_id == user && f.article_id == article));
    Ok(t.favorites.len() < before)
  }

  async fn list_favorite_articles(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Article>> {
    let t = self.tables();
    let favorites = sorted_desc(
      t.favorites.values().filter(|f| f.user_id == user).cloned(),
      |f| (f.created_at, f.id));
    let items = favorites.iter()
      .filter_map(|f| t.articles.get(&f.article_id))
      .filter(|a| a.is_published())
      .cloned()
      .collect();
    Ok(paged(items, req))
  }
}

#[async_trait]
impl FollowRepository for MemoryTx {
  async fn find_follow(&mut self, follower: UserId, following: UserId) -> Result<Option<Follow>> {
    Ok(self.tables().follows.values()
      .find(|f| f.follower_id == follower && f.following_id == following)
      .cloned())
  }

  async fn insert_follow(&mut self, follower: UserId, following: UserId) -> Result<Follow> {
    let t = self.tables();
    t.require_user(follower, "follows_follower_id_fkey")?;
    t.require_user(following, "follows_following_id_fkey")?;
    if follower == following {
      return Err(Error::IntegrityViolation("ck_follow_not_self".to_string()));
    }
    if t.follows.values().any(|f| f.follower_id == follower && f.following_id == following) {
      return Err(Error::conflict("uk_follower_following"));
    }
    let follow = Follow {
      id: t.next_id(),
      follower_id: follower,
      following_id: following,
      created_at: now(),
    };
    t.follows.insert(follow.id, follow.clone());
    Ok(follow)
  }

  async fn delete_follow(&mut self, follower: UserId, following: UserId) -> Result<bool> {
    let t = self.tables();
    let before = t.follows.len();
    t.follows.retain(|_, f| !(f.follower_id == follower && f.following_id == following));
    Ok(t.follows.len() < before)
  }

  async fn followers_after(&mut self, user: UserId, after: Option<UserId>, limit: i64)
    -> Result<Vec<UserId>> {
    let t = self.tables();
    let mut ids: Vec<UserId> = t.follows.values()
      .filter(|f| f.following_id == user && after.map_or(true, |after| f.follower_id > after))
      .map(|f| f.follower_id)
      .collect();
    ids.sort_unstable();
    ids.truncate(limit.max(0) as usize);
    Ok(ids)
  }

  async fn list_followers(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>> {
    let t = self.tables();
    let follows = sorted_desc(
      t.follows.values().filter(|f| f.following_id == user).cloned(),
      |f| (f.created_at, f.id));
    let items = follows.iter().filter_map(|f| t.users.get(&f.follower_id)).cloned().collect();
    Ok(paged(items, req))
  }

  async fn list_following(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>> {
    let t = self.tables();
    let follows = sorted_desc(
      t.follows.values().filter(|f| f.follower_id == user).cloned(),
      |f| (f.created_at, f.id));
    let items = follows.iter().filter_map(|f| t.users.get(&f.following_id)).cloned().collect();
    Ok(paged(items, req))
  }

  async fn count_followers(&mut self, user: UserId) -> Result<i64> {
    Ok(self.tables().follows.values().filter(|f| f.following_id == user).count() as i64)
  }

  async fn count_following(&mut self, user: UserId) -> Result<i64> {
    Ok(self.tables().follows.values().filter(|f| f.follower_id == user).count() as i64)
  }
}

#[async_trait]
impl NotificationRepository for MemoryTx {
  async fn insert_notifications(&mut self, batch: &[NewNotification]) -> Result<u64> {
    let t = self.tables();
    for n in batch.iter() {
      t.require_user(n.recipient_id, "notifications_recipient_id_fkey")?;
      t.require_article(n.article_id, "notifications_article_id_fkey")?;
    }
    let ts = now();
    for n in batch.iter() {
      let notification = Notification {
        id: t.next_id(),
        recipient_id: n.recipient_id,
        article_id: n.article_id,
        message: n.message.clone(),
        read: false,
        created_at: ts,
      };
      t.notifications.insert(notification.id, notification);
    }
    Ok(batch.len() as u64)
  }

  async fn find_notification(&mut self, id: NotificationId) -> Result<Option<Notification>> {
    Ok(self.tables().notifications.get(&id).cloned())
  }

  async fn list_notifications(&mut self, user: UserId, unread_only: bool, req: &PageRequest)
    -> Result<Page<Notification>> {
    let t = self.tables();
    let items = sorted_desc(
      t.notifications.values()
        .filter(|n| n.recipient_id == user && (!unread_only || !n.read))
        .cloned(),
      |n| (n.created_at, n.id));
    Ok(paged(items, req))
  }

  async fn mark_read(&mut self, id: NotificationId) -> Result<bool> {
    Ok(self.tables().notifications.get_mut(&id).map(|n| n.read = true).is_some())
  }

  async fn mark_all_read(&mut self, user: UserId) -> Result<u64> {
    let mut count = 0;
    for n in self.tables().notifications.values_mut() {
      if n.recipient_id == user && !n.read {
        n.read = true;
        count += 1;
      }
    }
    Ok(count)
  }

  async fn count_unread(&mut self, user: UserId) -> Result<i64> {
    Ok(self.tables().notifications.values()
      .filter(|n| n.recipient_id == user && !n.read)
      .count() as i64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn seed(store: &MemoryStore) -> (User, Category) {
    let mut tx = store.begin().await.unwrap();
    let user = tx.insert_user("ana", "ana@example.com").await.unwrap();
    let category = tx.insert_category("RUST").await.unwrap();
    tx.commit().await.unwrap();
    (user, category)
  }

  fn draft(author: UserId, category: CategoryId, title: &str) -> NewArticle {
    NewArticle {
      title: title.to_string(),
      content: "Some long enough content".to_string(),
      status: ArticleStatus::Draft,
      author_id: author,
      category_id: category,
    }
  }

  #[tokio::test]
  async fn dropped_transaction_rolls_back() {
    let store = MemoryStore::new();
    let (user, category) = seed(&store).await;
    {
      let mut tx = store.begin().await.unwrap();
      tx.insert_article(&draft(user.id, category.id, "Gone")).await.unwrap();
    }
    let mut tx = store.begin().await.unwrap();
    let page = tx.list_articles(ArticleStatus::Draft, None, &PageRequest::default()).await.unwrap();
    assert!(page.is_empty());
  }

  #[tokio::test]
  async fn savepoint_rollback_keeps_earlier_work() {
    let store = MemoryStore::new();
    let (user, category) = seed(&store).await;
    let mut tx = store.begin().await.unwrap();
    tx.insert_article(&draft(user.id, category.id, "Kept")).await.unwrap();
    tx.savepoint("sp").await.unwrap();
    tx.insert_article(&draft(user.id, category.id, "Undone")).await.unwrap();
    tx.rollback_to("sp").await.unwrap();
    tx.release("sp").await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let page = tx.list_articles(ArticleStatus::Draft, None, &PageRequest::default()).await.unwrap();
    assert_eq!(page.items.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(), vec!["Kept"]);
  }

  #[tokio::test]
  async fn constraints_match_the_schema() {
    let store = MemoryStore::new();
    let (user, category) = seed(&store).await;
    let mut tx = store.begin().await.unwrap();
    tx.insert_article(&draft(user.id, category.id, "Hello")).await.unwrap();
    assert!(matches!(
      tx.insert_article(&draft(user.id, category.id, "HELLO")).await,
      Err(Error::Conflict(_))));
    assert!(matches!(tx.insert_category("RUST").await, Err(Error::Conflict(_))));
    assert!(matches!(tx.delete_category(category.id).await, Err(Error::IntegrityViolation(_))));
    assert!(matches!(tx.insert_follow(user.id, user.id).await, Err(Error::IntegrityViolation(_))));
  }

  #[tokio::test]
  async fn deleting_a_comment_removes_its_replies() {
    let store = MemoryStore::new();
    let (user, category) = seed(&store).await;
    let mut tx = store.begin().await.unwrap();
    let article = tx.insert_article(&draft(user.id, category.id, "Thread")).await.unwrap();
    let mut parent = None;
    for n in 0..3 {
      let comment = tx.insert_comment(&NewComment {
        content: format!("level {}", n),
        author_id: user.id,
        article_id: article.id,
        parent_id: parent,
      }).await.unwrap();
      parent = Some(comment.id);
    }
    let root = tx.list_root_comments(article.id, &PageRequest::default()).await.unwrap();
    assert_eq!(tx.delete_comment(root.items[0].id).await.unwrap(), 3);
    assert_eq!(tx.count_comments(article.id).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn counters_never_go_negative() {
    let store = MemoryStore::new();
    let (user, category) = seed(&store).await;
    let mut tx = store.begin().await.unwrap();
    let article = tx.insert_article(&draft(user.id, category.id, "Counted")).await.unwrap();
    assert_eq!(tx.adjust_likes_count(article.id, -1).await.unwrap(), Some(0));
    assert_eq!(tx.adjust_comments_count(article.id, 2).await.unwrap(), Some(2));
    assert_eq!(tx.recount_comments(article.id).await.unwrap(), Some(0));
    assert_eq!(tx.adjust_likes_count(9999, 1).await.unwrap(), None);
  }
}

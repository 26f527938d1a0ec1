mod common;

use common::*;

use verso::db::MemoryStore;
use verso::error::Error;
use verso::forms::*;
use verso::models::*;
use verso::services::{NotificationFanout, Services};

#[tokio::test]
async fn publishing_notifies_each_follower_once() {
  let services = services();
  let ana = user(&services, "ana").await;
  let mut followers = Vec::new();
  for n in 0..7 {
    let follower = user(&services, &format!("reader{}", n)).await;
    services.profiles.follow(ana.id, &follower).await.unwrap();
    followers.push(follower);
  }

  let article = published(&services, &ana, "Async Rust").await;
  for follower in followers.iter() {
    let page = services.notifications.list(follower, &all()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].article_id, article.id);
    assert_eq!(page.items[0].message, "ana published a new article: Async Rust");
    assert!(!page.items[0].read);
  }
  assert_eq!(services.notifications.unread_count(&ana).await.unwrap(), 0);
}

#[tokio::test]
async fn fanout_pages_through_large_follower_sets() {
  let store = MemoryStore::new();
  let config = verso::app::AppConfig::from_toml_str("[notification]\nfanout_page_size = 2").unwrap();
  let services = Services::from_app_config(store, &config).unwrap();
  let ana = user(&services, "ana").await;
  let mut readers = Vec::new();
  for n in 0..5 {
    let follower = user(&services, &format!("reader{}", n)).await;
    services.profiles.follow(ana.id, &follower).await.unwrap();
    readers.push(follower);
  }
  let article = published(&services, &ana, "Paged").await;

  let mut total = 0;
  for reader in readers.iter() {
    let page = services.notifications.list(reader, &all()).await.unwrap();
    assert!(page.items.iter().all(|note| note.article_id == article.id));
    total += page.total;
  }
  assert_eq!(total, 5);
  assert_eq!(NotificationFanout::default().page_size, 500);
}

#[tokio::test]
async fn drafts_notify_nobody_until_published() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  services.profiles.follow(ana.id, &bo).await.unwrap();

  let article = draft(&services, &ana, "Later").await;
  assert_eq!(services.notifications.unread_count(&bo).await.unwrap(), 0);

  // a draft edit that stays draft sends nothing either.
  services.articles.update(article.id, &status_patch("draft"), &ana).await.unwrap();
  assert_eq!(services.notifications.unread_count(&bo).await.unwrap(), 0);

  services.articles.update(article.id, &status_patch("published"), &ana).await.unwrap();
  assert_eq!(services.notifications.unread_count(&bo).await.unwrap(), 1);

  // re-saving a published article does not publish again.
  services.articles.update(article.id, &status_patch("PUBLISHED"), &ana).await.unwrap();
  assert_eq!(services.notifications.unread_count(&bo).await.unwrap(), 1);
}

#[tokio::test]
async fn comments_notify_the_author_unless_self() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let article = published(&services, &ana, "Feedback").await;

  services.comments.create(article.id, &CreateComment::new("my own note"), &ana).await.unwrap();
  assert_eq!(services.notifications.unread_count(&ana).await.unwrap(), 0);

  services.comments.create(article.id, &CreateComment::new("great read"), &bo).await.unwrap();
  let page = services.notifications.list(&ana, &all()).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].message, "New comment on your article \"Feedback\"");
}

#[tokio::test]
async fn read_flags() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let cy = user(&services, "cy").await;
  let article = published(&services, &ana, "Inbox").await;
  services.comments.create(article.id, &CreateComment::new("one"), &bo).await.unwrap();
  services.comments.create(article.id, &CreateComment::new("two"), &cy).await.unwrap();

  let unread = services.notifications.list_unread(&ana, &all()).await.unwrap();
  assert_eq!(unread.total, 2);
  let first = unread.items[0].id;

  assert!(matches!(services.notifications.mark_read(first, &bo).await, Err(Error::NotFound(_))));
  assert!(matches!(services.notifications.mark_read(9999, &ana).await, Err(Error::NotFound(_))));
  let marked = services.notifications.mark_read(first, &ana).await.unwrap();
  assert!(marked.read);
  assert_eq!(services.notifications.unread_count(&ana).await.unwrap(), 1);

  assert_eq!(services.notifications.mark_all_read(&ana).await.unwrap(), 1);
  assert_eq!(services.notifications.unread_count(&ana).await.unwrap(), 0);
  assert_eq!(services.notifications.list(&ana, &all()).await.unwrap().total, 2);
  assert!(services.notifications.list_unread(&ana, &all()).await.unwrap().is_empty());
}

/// A (no followers) drafts "X", publishes it while B follows, C likes and
/// comments, A replies to C.
#[tokio::test]
async fn publish_react_comment_reply_walkthrough() {
  let services = services();
  let a = user(&services, "a").await;
  let b = user(&services, "b").await;
  let c = user(&services, "c").await;

  let x = draft(&services, &a, "X marks the spot").await;
  assert_eq!(x.comments_count, 0);
  assert_eq!(x.likes_count, 0);
  for u in [&a, &b, &c] {
    assert_eq!(services.notifications.unread_count(u).await.unwrap(), 0);
  }

  services.profiles.follow(a.id, &b).await.unwrap();
  services.articles.update(x.id, &status_patch("PUBLISHED"), &a).await.unwrap();
  assert_eq!(services.notifications.unread_count(&b).await.unwrap(), 1);

  services.reactions.add_or_update(x.id, ReactionType::Like, &c).await.unwrap();
  assert_eq!(services.articles.find_by_id(x.id, None).await.unwrap().likes_count, 1);

  let comment = services.comments.create(x.id, &CreateComment::new("Found it"), &c).await.unwrap();
  let a_unread = services.notifications.unread_count(&a).await.unwrap();
  services.comments.create(x.id, &CreateComment::reply("Well done", comment.id), &a).await.unwrap();

  let x = services.articles.find_by_id(x.id, None).await.unwrap();
  assert_eq!(x.comments_count, 2);
  let c_notes = services.notifications.list(&c, &all()).await.unwrap();
  assert_eq!(c_notes.total, 1);
  assert_eq!(c_notes.items[0].message, "New reply to your comment");
  // replying sends nothing to the replier.
  assert_eq!(services.notifications.unread_count(&a).await.unwrap(), a_unread);
}

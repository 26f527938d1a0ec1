mod common;

use common::*;

use verso::db::MemoryStore;
use verso::error::Error;
use verso::forms::*;
use verso::models::*;
use verso::services::Services;

async fn comments_count(services: &Services<MemoryStore>, article: ArticleId) -> i64 {
  services.articles.find_by_id(article, None).await.unwrap().comments_count
}

#[tokio::test]
async fn counter_tracks_creates_and_cascaded_deletes() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let article = published(&services, &ana, "Borrowing").await;

  let root = services.comments.create(article.id, &CreateComment::new("first"), &bo).await.unwrap();
  let reply = services.comments.create(article.id, &CreateComment::reply("second", root.id), &ana)
    .await.unwrap();
  services.comments.create(article.id, &CreateComment::reply("third", reply.id), &bo).await.unwrap();
  let other = services.comments.create(article.id, &CreateComment::new("fourth"), &bo).await.unwrap();
  assert_eq!(comments_count(&services, article.id).await, 4);

  // removing the root takes both replies with it.
  services.comments.delete(root.id, &bo).await.unwrap();
  assert_eq!(comments_count(&services, article.id).await, 1);

  services.comments.delete(other.id, &ana).await.unwrap();
  assert_eq!(comments_count(&services, article.id).await, 0);
  let page = services.comments.list_flat(article.id, None, &all()).await.unwrap();
  assert!(page.is_empty());
}

#[tokio::test]
async fn parent_must_exist_on_the_same_article() {
  let services = services();
  let ana = user(&services, "ana").await;
  let one = published(&services, &ana, "One").await;
  let two = published(&services, &ana, "Two").await;
  let root = services.comments.create(one.id, &CreateComment::new("hello"), &ana).await.unwrap();

  let res = services.comments.create(two.id, &CreateComment::reply("wrong", root.id), &ana).await;
  assert!(matches!(res, Err(Error::Forbidden(_))));
  let res = services.comments.create(one.id, &CreateComment::reply("gone", 9999), &ana).await;
  assert!(matches!(res, Err(Error::NotFound(_))));
  let res = services.comments.create(9999, &CreateComment::new("nowhere"), &ana).await;
  assert!(matches!(res, Err(Error::NotFound(_))));
  assert_eq!(comments_count(&services, two.id).await, 0);
}

#[tokio::test]
async fn drafts_only_take_comments_from_their_author() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let article = draft(&services, &ana, "Unfinished").await;

  let res = services.comments.create(article.id, &CreateComment::new("peek"), &bo).await;
  assert!(matches!(res, Err(Error::NotFound(_))));
  services.comments.create(article.id, &CreateComment::new("note to self"), &ana).await.unwrap();
}

#[tokio::test]
async fn content_is_validated_and_trimmed() {
  let services = services();
  let ana = user(&services, "ana").await;
  let article = published(&services, &ana, "Strings").await;
  let res = services.comments.create(article.id, &CreateComment::new("   "), &ana).await;
  assert!(matches!(res, Err(Error::Validation(_))));
  let comment = services.comments.create(article.id, &CreateComment::new("  padded  "), &ana)
    .await.unwrap();
  assert_eq!(comment.content, "padded");
}

#[tokio::test]
async fn deletion_rights() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let cy = user(&services, "cy").await;
  let article = published(&services, &ana, "Rights").await;
  let by_bo = services.comments.create(article.id, &CreateComment::new("bo here"), &bo).await.unwrap();

  assert!(matches!(services.comments.delete(by_bo.id, &cy).await, Err(Error::Forbidden(_))));
  assert!(matches!(services.comments.delete(9999, &cy).await, Err(Error::NotFound(_))));
  // the article author moderates.
  services.comments.delete(by_bo.id, &ana).await.unwrap();
}

#[tokio::test]
async fn threaded_listing_nests_replies_without_depth_limit() {
  let services = services();
  let ana = user(&services, "ana").await;
  let article = published(&services, &ana, "Threads").await;

  let first = services.comments.create(article.id, &CreateComment::new("root 1"), &ana).await.unwrap();
  let second = services.comments.create(article.id, &CreateComment::new("root 2"), &ana).await.unwrap();
  let mut parent = first.id;
  for level in 1..=4 {
    let reply = CreateComment::reply(&format!("level {}", level), parent);
    parent = services.comments.create(article.id, &reply, &ana).await.unwrap().id;
  }
  services.comments.create(article.id, &CreateComment::reply("sibling", first.id), &ana)
    .await.unwrap();

  let page = services.comments.list_threaded(article.id, None, &all()).await.unwrap();
  assert_eq!(page.total, 2);
  assert_eq!(page.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![first.id, second.id]);
  let tree = &page.items[0];
  assert_eq!(tree.count(), 6);
  assert_eq!(tree.depth(), 4);
  assert_eq!(tree.replies.iter().map(|r| r.content.as_str()).collect::<Vec<_>>(),
    vec!["level 1", "sibling"]);
  assert!(page.items[1].replies.is_empty());

  let flat = services.comments.list_flat(article.id, None, &all()).await.unwrap();
  assert_eq!(flat.total, 7);
}

#[tokio::test]
async fn threaded_listing_pages_over_roots() {
  let services = services();
  let ana = user(&services, "ana").await;
  let article = published(&services, &ana, "Paging").await;
  for n in 0..3 {
    let root = services.comments.create(article.id, &CreateComment::new(&format!("root {}", n)), &ana)
      .await.unwrap();
    services.comments.create(article.id, &CreateComment::reply("reply", root.id), &ana)
      .await.unwrap();
  }
  let page = services.comments.list_threaded(article.id, None, &PageRequest::new(1, 2)).await.unwrap();
  assert_eq!(page.total, 3);
  assert_eq!(page.len(), 1);
  assert_eq!(page.items[0].content, "root 2");
  assert_eq!(page.items[0].replies.len(), 1);
}

#[tokio::test]
async fn hidden_draft_comments_are_not_listed() {
  let services = services();
  let ana = user(&services, "ana").await;
  let bo = user(&services, "bo").await;
  let article = draft(&services, &ana, "Private").await;
  let res = services.comments.list_flat(article.id, Some(&bo), &all()).await;
  assert!(matches!(res, Err(Error::NotFound(_))));
  assert!(services.comments.list_threaded(article.id, Some(&ana), &all()).await.is_ok());
}

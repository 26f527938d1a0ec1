mod common;

use common::*;

use verso::error::Error;
use verso::forms::*;
use verso::services::DEFAULT_CATEGORY;

#[tokio::test]
async fn concurrent_resolves_create_one_row() {
  let services = services();
  let (left, right) = futures::join!(
    services.categories.resolve("Systems"),
    services.categories.resolve("  systems "),
  );
  let (left, right) = (left.unwrap(), right.unwrap());
  assert_eq!(left.id, right.id);
  assert_eq!(left.name, "SYSTEMS");

  let page = services.categories.list(&all()).await.unwrap();
  assert_eq!(page.total, 1);
}

#[tokio::test]
async fn articles_share_resolved_categories() {
  let services = services();
  let ana = user(&services, "ana").await;
  let one = services.articles.create(&article_form("One", "web", "DRAFT"), &ana).await.unwrap();
  let two = services.articles.create(&article_form("Two", "WEB", "DRAFT"), &ana).await.unwrap();
  assert_eq!(one.category_id, two.category_id);
}

#[tokio::test]
async fn deleting_a_category_moves_articles_to_the_default() {
  let services = services();
  let ana = user(&services, "ana").await;
  let article = services.articles.create(&article_form("Moved", "old stuff", "PUBLISHED"), &ana)
    .await.unwrap();

  services.categories.delete(article.category_id).await.unwrap();
  let moved = services.articles.find_by_id(article.id, None).await.unwrap();
  let category = services.categories.find(moved.category_id).await.unwrap();
  assert_eq!(category.name, DEFAULT_CATEGORY);

  assert!(matches!(services.categories.find(article.category_id).await, Err(Error::NotFound(_))));
  assert!(matches!(services.categories.delete(category.id).await, Err(Error::BusinessRule(_))));
  assert!(matches!(services.categories.delete(9999).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn default_category_bootstrap_is_idempotent() {
  let services = services();
  let first = services.categories.ensure_default().await.unwrap();
  let second = services.categories.ensure_default().await.unwrap();
  assert_eq!(first.id, second.id);
  assert_eq!(first.name, DEFAULT_CATEGORY);
}

#[tokio::test]
async fn create_and_rename() {
  let services = services();
  let tools = services.categories.create(&CategoryName::new("tools")).await.unwrap();
  assert!(matches!(
    services.categories.create(&CategoryName::new(" TOOLS ")).await,
    Err(Error::Conflict(_))));
  assert!(matches!(
    services.categories.create(&CategoryName::new(&"x".repeat(61))).await,
    Err(Error::Validation(_))));

  let renamed = services.categories.rename(tools.id, &CategoryName::new("tooling")).await.unwrap();
  assert_eq!(renamed.name, "TOOLING");
  services.categories.create(&CategoryName::new("ops")).await.unwrap();
  assert!(matches!(
    services.categories.rename(tools.id, &CategoryName::new("Ops")).await,
    Err(Error::Conflict(_))));
  assert!(matches!(
    services.categories.rename(9999, &CategoryName::new("none")).await,
    Err(Error::NotFound(_))));
}

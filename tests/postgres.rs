//! Runs against a real database only when `VERSO_TEST_DATABASE_URL` is set.

use verso::db::{schema, PgStore};
use verso::error::Error;
use verso::forms::*;
use verso::models::*;
use verso::services::Services;

fn store() -> Option<PgStore> {
  let url = std::env::var("VERSO_TEST_DATABASE_URL").ok()?;
  Some(PgStore::new(&url, 4).unwrap())
}

fn unique(prefix: &str) -> String {
  let nanos = std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .unwrap()
    .as_nanos();
  format!("{}{}", prefix, nanos)
}

#[tokio::test]
async fn postgres_smoke() {
  let store = match store() {
    Some(store) => store,
    None => return,
  };
  schema::migrate(&store).await.unwrap();
  let services = Services::new(store);

  let author_name = unique("author");
  let reader_name = unique("reader");
  let author = services.users.register(
    &RegisterUser::new(&author_name, &format!("{}@example.com", author_name))).await.unwrap();
  let reader = services.users.register(
    &RegisterUser::new(&reader_name, &format!("{}@example.com", reader_name))).await.unwrap();
  services.profiles.follow(author.id, &reader).await.unwrap();

  let form = CreateArticle {
    title: unique("Title "),
    content: "Postgres backed article body".to_string(),
    category: unique("cat"),
    status: "PUBLISHED".to_string(),
  };
  let article = services.articles.create(&form, &author).await.unwrap();
  let again = services.articles.create(&form, &author).await;
  assert!(matches!(again, Err(Error::Conflict(_))));

  let (left, right) = futures::join!(
    services.categories.resolve(&form.category),
    services.categories.resolve(&form.category),
  );
  assert_eq!(left.unwrap().id, right.unwrap().id);

  let comment = services.comments.create(article.id, &CreateComment::new("hi"), &reader)
    .await.unwrap();
  services.comments.create(article.id, &CreateComment::reply("hello", comment.id), &author)
    .await.unwrap();
  services.reactions.add_or_update(article.id, ReactionType::Like, &reader).await.unwrap();
  let stored = services.articles.find_by_id(article.id, None).await.unwrap();
  assert_eq!(stored.comments_count, 2);
  assert_eq!(stored.likes_count, 1);

  services.comments.delete(comment.id, &reader).await.unwrap();
  let stored = services.articles.find_by_id(article.id, None).await.unwrap();
  assert_eq!(stored.comments_count, 0);

  assert_eq!(services.notifications.unread_count(&reader).await.unwrap(), 2);
  services.articles.delete(article.id, &author).await.unwrap();
  assert_eq!(services.notifications.unread_count(&reader).await.unwrap(), 0);
}

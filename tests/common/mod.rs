#![allow(dead_code)]

use verso::db::MemoryStore;
use verso::forms::*;
use verso::models::*;
use verso::services::Services;

pub fn services() -> Services<MemoryStore> {
  let _ = env_logger::builder().is_test(true).try_init();
  Services::new(MemoryStore::new())
}

pub async fn user(services: &Services<MemoryStore>, name: &str) -> User {
  let form = RegisterUser::new(name, &format!("{}@example.com", name));
  services.users.register(&form).await.unwrap()
}

pub fn article_form(title: &str, category: &str, status: &str) -> CreateArticle {
  CreateArticle {
    title: title.to_string(),
    content: format!("{} explained at some length.", title),
    category: category.to_string(),
    status: status.to_string(),
  }
}

pub async fn draft(services: &Services<MemoryStore>, author: &User, title: &str) -> Article {
  let form = article_form(title, "rust", "DRAFT");
  services.articles.create(&form, author).await.unwrap()
}

pub async fn published(services: &Services<MemoryStore>, author: &User, title: &str) -> Article {
  let form = article_form(title, "rust", "PUBLISHED");
  services.articles.create(&form, author).await.unwrap()
}

pub fn status_patch(status: &str) -> UpdateArticle {
  UpdateArticle {
    status: Some(status.to_string()),
    ..Default::default()
  }
}

pub fn all() -> PageRequest {
  PageRequest::new(0, 100)
}

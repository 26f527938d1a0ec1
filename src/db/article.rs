use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait ArticleRepository {
  async fn find_article(&mut self, id: ArticleId) -> Result<Option<Article>>;

  /// Case-insensitive title match among `author`'s articles, ignoring `except`.
  async fn article_title_taken(&mut self, author: UserId, title: &str, except: Option<ArticleId>)
    -> Result<bool>;

  async fn insert_article(&mut self, article: &NewArticle) -> Result<Article>;

  /// Store the editable fields (title, content, status, category) and bump `updated_at`.
  /// Counters are left alone.
  async fn save_article(&mut self, article: &Article) -> Result<Article>;

  async fn delete_article(&mut self, id: ArticleId) -> Result<bool>;

  /// Newest first, optionally restricted to one author.
  async fn list_articles(&mut self, status: ArticleStatus, author: Option<UserId>, req: &PageRequest)
    -> Result<Page<Article>>;

  /// Move every article of `from` into `to`.  Returns the number moved.
  async fn reassign_category(&mut self, from: CategoryId, to: CategoryId) -> Result<u64>;

  /// Atomic `comments_count += delta`, floored at zero.  `None` if the article is gone.
  async fn adjust_comments_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>>;

  /// Reset `comments_count` to the number of stored comments.
  async fn recount_comments(&mut self, id: ArticleId) -> Result<Option<i64>>;

  /// Atomic `likes_count += delta`, floored at zero.
  async fn adjust_likes_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>>;
}

lazy_static! {
  pub(crate) static ref ARTICLE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "articles",
      columns: vec![
        primary("id"),
        column("title"),
        column("content"),
        column("status"),
        column("author_id"),
        column("category_id"),
        generated("comments_count"),
        generated("likes_count"),
        generated("created_at"),
        generated("updated_at"),
      ],
    }
  };

  static ref ARTICLE_BY_ID: String =
    format!("{} WHERE id = $1", ARTICLE_COLUMNS.build_select_query());
  static ref INSERT_ARTICLE: String = ARTICLE_COLUMNS.build_insert_query();
  static ref SAVE_ARTICLE: String = ARTICLE_COLUMNS.build_update_query(
    &["title", "content", "status", "category_id"],
    "updated_at = (NOW() AT TIME ZONE 'utc')");
  static ref LIST_ARTICLES: String = format!(
    r#"{} WHERE status = $1 AND ($2::BIGINT IS NULL OR author_id = $2)
    ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"#,
    ARTICLE_COLUMNS.build_select_query());
}

static TITLE_TAKEN: &str = r#"
SELECT EXISTS(
  SELECT 1 FROM articles
  WHERE author_id = $1 AND LOWER(title) = LOWER($2) AND ($3::BIGINT IS NULL OR id <> $3)
)"#;

static COUNT_ARTICLES: &str = r#"
SELECT COUNT(*) FROM articles WHERE status = $1 AND ($2::BIGINT IS NULL OR author_id = $2)"#;

pub(crate) fn article_from_row(row: &Row) -> Article {
  Article {
    id: row.get(0),
    title: row.get(1),
    content: row.get(2),
    status: row.get(3),
    author_id: row.get(4),
    category_id: row.get(5),
    comments_count: row.get(6),
    likes_count: row.get(7),
    created_at: row.get(8),
    updated_at: row.get(9),
  }
}

#[async_trait]
impl ArticleRepository for PgTx {
  async fn find_article(&mut self, id: ArticleId) -> Result<Option<Article>> {
    let row = self.query_opt(&ARTICLE_BY_ID, &[&id]).await?;
    Ok(row.as_ref().map(article_from_row))
  }

  async fn article_title_taken(&mut self, author: UserId, title: &str, except: Option<ArticleId>)
    -> Result<bool> {
    let row = self.query_one(TITLE_TAKEN, &[&author, &title, &except]).await?;
    Ok(row.get(0))
  }

  async fn insert_article(&mut self, article: &NewArticle) -> Result<Article> {
    let row = self.query_one(&INSERT_ARTICLE, &[
      &article.title, &article.content, &article.status,
      &article.author_id, &article.category_id,
    ]).await?;
    Ok(article_from_row(&row))
  }

  async fn save_article(&mut self, article: &Article) -> Result<Article> {
    let row = self.query_opt(&SAVE_ARTICLE, &[
      &article.title, &article.content, &article.status, &article.category_id,
      &article.id,
    ]).await?;
    row.as_ref()
      .map(article_from_row)
      .ok_or_else(|| Error::not_found(format!("article {}", article.id)))
  }

  async fn delete_article(&mut self, id: ArticleId) -> Result<bool> {
    let count = self.execute("DELETE FROM articles WHERE id = $1", &[&id]).await?;
    Ok(count > 0)
  }

  async fn list_articles(&mut self, status: ArticleStatus, author: Option<UserId>, req: &PageRequest)
    -> Result<Page<Article>> {
    let rows = self.query(&LIST_ARTICLES, &[&status, &author, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one(COUNT_ARTICLES, &[&status, &author]).await?.get(0);
    Ok(page_of(rows.iter().map(article_from_row).collect(), req, total))
  }

  async fn reassign_category(&mut self, from: CategoryId, to: CategoryId) -> Result<u64> {
    self.execute("UPDATE articles SET category_id = $2 WHERE category_id = $1", &[&from, &to]).await
  }

  async fn adjust_comments_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>> {
    let row = self.query_opt(
      "UPDATE articles SET comments_count = GREATEST(comments_count + $2, 0) WHERE id = $1 RETURNING comments_count",
      &[&id, &delta]).await?;
    Ok(row.map(|row| row.get(0)))
  }

  async fn recount_comments(&mut self, id: ArticleId) -> Result<Option<i64>> {
    let row = self.query_opt(r#"UPDATE articles
      SET comments_count = (SELECT COUNT(*) FROM comments WHERE article_id = $1)
      WHERE id = $1 RETURNING comments_count"#, &[&id]).await?;
    Ok(row.map(|row| row.get(0)))
  }

  async fn adjust_likes_count(&mut self, id: ArticleId, delta: i64) -> Result<Option<i64>> {
    let row = self.query_opt(
      "UPDATE articles SET likes_count = GREATEST(likes_count + $2, 0) WHERE id = $1 RETURNING likes_count",
      &[&id, &delta]).await?;
    Ok(row.map(|row| row.get(0)))
  }
}

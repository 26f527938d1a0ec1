use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait CommentRepository {
  async fn find_comment(&mut self, id: CommentId) -> Result<Option<Comment>>;

  async fn insert_comment(&mut self, comment: &NewComment) -> Result<Comment>;

  /// Delete a comment and, transitively, its replies.  Returns how many rows went.
  async fn delete_comment(&mut self, id: CommentId) -> Result<u64>;

  async fn count_comments(&mut self, article: ArticleId) -> Result<i64>;

  /// Every comment of the article, oldest first.
  async fn list_comments(&mut self, article: ArticleId, req: &PageRequest) -> Result<Page<Comment>>;

  /// Top level comments only, oldest first.
  async fn list_root_comments(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Comment>>;

  /// The whole comment set of an article, oldest first.
  async fn all_comments(&mut self, article: ArticleId) -> Result<Vec<Comment>>;
}

lazy_static! {
  static ref COMMENT_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "comments",
      columns: vec![
        primary("id"),
        column("content"),
        column("author_id"),
        column("article_id"),
        column("parent_id"),
        generated("created_at"),
        generated("updated_at"),
      ],
    }
  };

  static ref COMMENT_BY_ID: String =
    format!("{} WHERE id = $1", COMMENT_COLUMNS.build_select_query());
  static ref INSERT_COMMENT: String = COMMENT_COLUMNS.build_insert_query();
  static ref LIST_COMMENTS: String = format!(
    "{} WHERE article_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3",
    COMMENT_COLUMNS.build_select_query());
  static ref LIST_ROOT_COMMENTS: String = format!(
    "{} WHERE article_id = $1 AND parent_id IS NULL ORDER BY created_at, id LIMIT $2 OFFSET $3",
    COMMENT_COLUMNS.build_select_query());
  static ref ALL_COMMENTS: String = format!(
    "{} WHERE article_id = $1 ORDER BY created_at, id",
    COMMENT_COLUMNS.build_select_query());
}

static DELETE_COMMENT: &str = r#"
WITH RECURSIVE doomed(id) AS (
  SELECT id FROM comments WHERE id = $1
  UNION
  SELECT c.id FROM comments c INNER JOIN doomed d ON c.parent_id = d.id
)
DELETE FROM comments WHERE id IN (SELECT id FROM doomed)"#;

fn comment_from_row(row: &Row) -> Comment {
  Comment {
    id: row.get(0),
    content: row.get(1),
    author_id: row.get(2),
    article_id: row.get(3),
    parent_id: row.get(4),
    created_at: row.get(5),
    updated_at: row.get(6),
  }
}

#[async_trait]
impl CommentRepository for PgTx {
  async fn find_comment(&mut self, id: CommentId) -> Result<Option<Comment>> {
    let row = self.query_opt(&COMMENT_BY_ID, &[&id]).await?;
    Ok(row.as_ref().map(comment_from_row))
  }

  async fn insert_comment(&mut self, comment: &NewComment) -> Result<Comment> {
    let row = self.query_one(&INSERT_COMMENT, &[
      &comment.content, &comment.author_id, &comment.article_id, &comment.parent_id,
    ]).await?;
    Ok(comment_from_row(&row))
  }

  async fn delete_comment(&mut self, id: CommentId) -> Result<u64> {
    self.execute(DELETE_COMMENT, &[&id]).await
  }

  async fn count_comments(&mut self, article: ArticleId) -> Result<i64> {
    let row = self.query_one("SELECT COUNT(*) FROM comments WHERE article_id = $1", &[&article])
      .await?;
    Ok(row.get(0))
  }

  async fn list_comments(&mut self, article: ArticleId, req: &PageRequest) -> Result<Page<Comment>> {
    let rows = self.query(&LIST_COMMENTS, &[&article, &req.limit(), &req.offset()]).await?;
    let total = self.count_comments(article).await?;
    Ok(page_of(rows.iter().map(comment_from_row).collect(), req, total))
  }

  async fn list_root_comments(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Comment>> {
    let rows = self.query(&LIST_ROOT_COMMENTS, &[&article, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one(
      "SELECT COUNT(*) FROM comments WHERE article_id = $1 AND parent_id IS NULL",
      &[&article]).await?.get(0);
    Ok(page_of(rows.iter().map(comment_from_row).collect(), req, total))
  }

  async fn all_comments(&mut self, article: ArticleId) -> Result<Vec<Comment>> {
    let rows = self.query(&ALL_COMMENTS, &[&article]).await?;
    Ok(rows.iter().map(comment_from_row).collect())
  }
}

use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait FavoriteRepository {
  async fn find_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Option<Favorite>>;

  /// `Conflict` when already favorited.
  async fn insert_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Favorite>;

  async fn delete_favorite(&mut self, user: UserId, article: ArticleId) -> Result<bool>;

  /// Published articles the user favorited, most recently favorited first.
  async fn list_favorite_articles(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Article>>;
}

lazy_static! {
  static ref FAVORITE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "favorites",
      columns: vec![
        primary("id"),
        column("user_id"),
        column("article_id"),
        generated("created_at"),
      ],
    }
  };

  static ref FAVORITE_BY_PAIR: String = format!(
    "{} WHERE user_id = $1 AND article_id = $2", FAVORITE_COLUMNS.build_select_query());
  static ref INSERT_FAVORITE: String = FAVORITE_COLUMNS.build_insert_query();
  static ref FAVORITE_ARTICLES: String = format!(r#"
SELECT {} FROM favorites f INNER JOIN articles a ON a.id = f.article_id
WHERE f.user_id = $1 AND a.status = 'PUBLISHED'
ORDER BY f.created_at DESC, f.id DESC LIMIT $2 OFFSET $3"#,
    ARTICLE_COLUMNS.get_columns(Some("a")));
}

static COUNT_FAVORITE_ARTICLES: &str = r#"
SELECT COUNT(*) FROM favorites f INNER JOIN articles a ON a.id = f.article_id
WHERE f.user_id = $1 AND a.status = 'PUBLISHED'"#;

fn favorite_from_row(row: &Row) -> Favorite {
  Favorite {
    id: row.get(0),
    user_id: row.get(1),
    article_id: row.get(2),
    created_at: row.get(3),
  }
}

#[async_trait]
impl FavoriteRepository for PgTx {
  async fn find_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Option<Favorite>> {
    let row = self.query_opt(&FAVORITE_BY_PAIR, &[&user, &article]).await?;
    Ok(row.as_ref().map(favorite_from_row))
  }

  async fn insert_favorite(&mut self, user: UserId, article: ArticleId) -> Result<Favorite> {
    let row = self.query_one(&INSERT_FAVORITE, &[&user, &article]).await?;
    Ok(favorite_from_row(&row))
  }

  async fn delete_favorite(&mut self, user: UserId, article: ArticleId) -> Result<bool> {
    let count = self.execute("DELETE FROM favorites WHERE user_id = $1 AND article_id = $2",
      &[&user, &article]).await?;
    Ok(count > 0)
  }

  async fn list_favorite_articles(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Article>> {
    let rows = self.query(&FAVORITE_ARTICLES, &[&user, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one(COUNT_FAVORITE_ARTICLES, &[&user]).await?.get(0);
    Ok(page_of(rows.iter().map(article_from_row).collect(), req, total))
  }
}

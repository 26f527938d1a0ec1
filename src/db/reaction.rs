use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait ReactionRepository {
  async fn find_reaction(&mut self, user: UserId, article: ArticleId) -> Result<Option<Reaction>>;

  /// `Conflict` when the user already reacted to the article.
  async fn insert_reaction(&mut self, user: UserId, article: ArticleId, kind: ReactionType)
    -> Result<Reaction>;

  async fn update_reaction(&mut self, id: i64, kind: ReactionType) -> Result<Option<Reaction>>;

  async fn delete_reaction(&mut self, id: i64) -> Result<bool>;

  /// Newest first.
  async fn list_reactions_by_article(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Reaction>>;

  /// Newest first.
  async fn list_reactions_by_user(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Reaction>>;

  /// Non-zero counts per type.
  async fn count_reactions_by_type(&mut self, article: ArticleId) -> Result<Vec<(ReactionType, i64)>>;
}

lazy_static! {
  static ref REACTION_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "reactions",
      columns: vec![
        primary("id"),
        column("reaction_type"),
        column("user_id"),
        column("article_id"),
        generated("created_at"),
        generated("updated_at"),
      ],
    }
  };

  static ref REACTION_BY_PAIR: String = format!(
    "{} WHERE user_id = $1 AND article_id = $2", REACTION_COLUMNS.build_select_query());
  static ref INSERT_REACTION: String = REACTION_COLUMNS.build_insert_query();
  static ref UPDATE_REACTION: String = REACTION_COLUMNS.build_update_query(
    &["reaction_type"], "updated_at = (NOW() AT TIME ZONE 'utc')");
  static ref REACTIONS_BY_ARTICLE: String = format!(
    "{} WHERE article_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    REACTION_COLUMNS.build_select_query());
  static ref REACTIONS_BY_USER: String = format!(
    "{} WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    REACTION_COLUMNS.build_select_query());
}

fn reaction_from_row(row: &Row) -> Reaction {
  Reaction {
    id: row.get(0),
    reaction_type: row.get(1),
    user_id: row.get(2),
    article_id: row.get(3),
    created_at: row.get(4),
    updated_at: row.get(5),
  }
}

#[async_trait]
impl ReactionRepository for PgTx {
  async fn find_reaction(&mut self, user: UserId, article: ArticleId) -> Result<Option<Reaction>> {
    let row = self.query_opt(&REACTION_BY_PAIR, &[&user, &article]).await?;
    Ok(row.as_ref().map(reaction_from_row))
  }

  async fn insert_reaction(&mut self, user: UserId, article: ArticleId, kind: ReactionType)
    -> Result<Reaction> {
    let row = self.query_one(&INSERT_REACTION, &[&kind, &user, &article]).await?;
    Ok(reaction_from_row(&row))
  }

  async fn update_reaction(&mut self, id: i64, kind: ReactionType) -> Result<Option<Reaction>> {
    let row = self.query_opt(&UPDATE_REACTION, &[&kind, &id]).await?;
    Ok(row.as_ref().map(reaction_from_row))
  }

  async fn delete_reaction(&mut self, id: i64) -> Result<bool> {
    let count = self.execute("DELETE FROM reactions WHERE id = $1", &[&id]).await?;
    Ok(count > 0)
  }

  async fn list_reactions_by_article(&mut self, article: ArticleId, req: &PageRequest)
    -> Result<Page<Reaction>> {
    let rows = self.query(&REACTIONS_BY_ARTICLE, &[&article, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one("SELECT COUNT(*) FROM reactions WHERE article_id = $1",
      &[&article]).await?.get(0);
    Ok(page_of(rows.iter().map(reaction_from_row).collect(), req, total))
  }

  async fn list_reactions_by_user(&mut self, user: UserId, req: &PageRequest)
    -> Result<Page<Reaction>> {
    let rows = self.query(&REACTIONS_BY_USER, &[&user, &req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one("SELECT COUNT(*) FROM reactions WHERE user_id = $1",
      &[&user]).await?.get(0);
    Ok(page_of(rows.iter().map(reaction_from_row).collect(), req, total))
  }

  async fn count_reactions_by_type(&mut self, article: ArticleId) -> Result<Vec<(ReactionType, i64)>> {
    let rows = self.query(r#"SELECT reaction_type, COUNT(*) FROM reactions
      WHERE article_id = $1 GROUP BY reaction_type ORDER BY reaction_type"#, &[&article]).await?;
    Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
  }
}

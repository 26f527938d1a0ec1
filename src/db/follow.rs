use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait FollowRepository {
  async fn find_follow(&mut self, follower: UserId, following: UserId) -> Result<Option<Follow>>;

  /// `Conflict` on a duplicate pair, `IntegrityViolation` on a self follow.
  async fn insert_follow(&mut self, follower: UserId, following: UserId) -> Result<Follow>;

  async fn delete_follow(&mut self, follower: UserId, following: UserId) -> Result<bool>;

  /// Keyset page of follower ids of `user`, ascending, strictly after `after`.
  async fn followers_after(&mut self, user: UserId, after: Option<UserId>, limit: i64)
    -> Result<Vec<UserId>>;

  /// Users following `user`, newest follow first.
  async fn list_followers(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>>;

  /// Users `user` follows, newest follow first.
  async fn list_following(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>>;

  async fn count_followers(&mut self, user: UserId) -> Result<i64>;

  async fn count_following(&mut self, user: UserId) -> Result<i64>;
}

lazy_static! {
  static ref FOLLOW_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "follows",
      columns: vec![
        primary("id"),
        column("follower_id"),
        column("following_id"),
        generated("created_at"),
      ],
    }
  };

  static ref FOLLOW_BY_PAIR: String = format!(
    "{} WHERE follower_id = $1 AND following_id = $2", FOLLOW_COLUMNS.build_select_query());
  static ref INSERT_FOLLOW: String = FOLLOW_COLUMNS.build_insert_query();
  static ref LIST_FOLLOWERS: String = format!(r#"
SELECT {} FROM follows f INNER JOIN users u ON u.id = f.follower_id
WHERE f.following_id = $1 ORDER BY f.created_at DESC, f.id DESC LIMIT $2 OFFSET $3"#,
    USER_COLUMNS.get_columns(Some("u")));
  static ref LIST_FOLLOWING: String = format!(r#"
SELECT {} FROM follows f INNER JOIN users u ON u.id = f.following_id
WHERE f.follower_id = $1 ORDER BY f.created_at DESC, f.id DESC LIMIT $2 OFFSET $3"#,
    USER_COLUMNS.get_columns(Some("u")));
}

static FOLLOWERS_AFTER: &str = r#"
SELECT follower_id FROM follows
WHERE following_id = $1 AND ($2::BIGINT IS NULL OR follower_id > $2)
ORDER BY follower_id LIMIT $3"#;

fn follow_from_row(row: &Row) -> Follow {
  Follow {
    id: row.get(0),
    follower_id: row.get(1),
    following_id: row.get(2),
    created_at: row.get(3),
  }
}

#[async_trait]
impl FollowRepository for PgTx {
  async fn find_follow(&mut self, follower: UserId, following: UserId) -> Result<Option<Follow>> {
    let row = self.query_opt(&FOLLOW_BY_PAIR, &[&follower, &following]).await?;
    Ok(row.as_ref().map(follow_from_row))
  }

  async fn insert_follow(&mut self, follower: UserId, following: UserId) -> Result<Follow> {
    let row = self.query_one(&INSERT_FOLLOW, &[&follower, &following]).await?;
    Ok(follow_from_row(&row))
  }

  async fn delete_follow(&mut self, follower: UserId, following: UserId) -> Result<bool> {
    let count = self.execute("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2",
      &[&follower, &following]).await?;
    Ok(count > 0)
  }

  async fn followers_after(&mut self, user: UserId, after: Option<UserId>, limit: i64)
    -> Result<Vec<UserId>> {
    let rows = self.query(FOLLOWERS_AFTER, &[&user, &after, &limit]).await?;
    Ok(rows.iter().map(|row| row.get(0)).collect())
  }

  async fn list_followers(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>> {
    let rows = self.query(&LIST_FOLLOWERS, &[&user, &req.limit(), &req.offset()]).await?;
    let total = self.count_followers(user).await?;
    Ok(page_of(rows.iter().map(user_from_row).collect(), req, total))
  }

  async fn list_following(&mut self, user: UserId, req: &PageRequest) -> Result<Page<User>> {
    let rows = self.query(&LIST_FOLLOWING, &[&user, &req.limit(), &req.offset()]).await?;
    let total = self.count_following(user).await?;
    Ok(page_of(rows.iter().map(user_from_row).collect(), req, total))
  }

  async fn count_followers(&mut self, user: UserId) -> Result<i64> {
    let row = self.query_one("SELECT COUNT(*) FROM follows WHERE following_id = $1", &[&user])
      .await?;
    Ok(row.get(0))
  }

  async fn count_following(&mut self, user: UserId) -> Result<i64> {
    let row = self.query_one("SELECT COUNT(*) FROM follows WHERE follower_id = $1", &[&user])
      .await?;
    Ok(row.get(0))
  }
}

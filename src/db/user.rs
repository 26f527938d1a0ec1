use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait UserRepository {
  async fn find_user(&mut self, id: UserId) -> Result<Option<User>>;

  async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>>;

  /// `Conflict` when the username or email is taken.
  async fn insert_user(&mut self, username: &str, email: &str) -> Result<User>;
}

lazy_static! {
  pub(crate) static ref USER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "users",
      columns: vec![
        primary("id"),
        column("username"),
        column("email"),
        generated("created_at"),
      ],
    }
  };

  static ref USER_BY_ID: String = format!("{} WHERE id = $1", USER_COLUMNS.build_select_query());
  static ref USER_BY_USERNAME: String =
    format!("{} WHERE username = $1", USER_COLUMNS.build_select_query());
  static ref INSERT_USER: String = USER_COLUMNS.build_insert_query();
}

pub(crate) fn user_from_row(row: &Row) -> User {
  User {
    id: row.get(0),
    username: row.get(1),
    email: row.get(2),
    created_at: row.get(3),
  }
}

#[async_trait]
impl UserRepository for PgTx {
  async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
    let row = self.query_opt(&USER_BY_ID, &[&id]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
    let row = self.query_opt(&USER_BY_USERNAME, &[&username]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  async fn insert_user(&mut self, username: &str, email: &str) -> Result<User> {
    let row = self.query_one(&INSERT_USER, &[&username, &email]).await?;
    Ok(user_from_row(&row))
  }
}

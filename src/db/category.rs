use async_trait::async_trait;

use tokio_postgres::Row;

use crate::error::*;
use crate::forms::PageRequest;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

#[async_trait]
pub trait CategoryRepository {
  async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>>;

  /// Exact match on the stored (normalized) name.
  async fn find_category_by_name(&mut self, name: &str) -> Result<Option<Category>>;

  /// `Conflict` when the name already exists.
  async fn insert_category(&mut self, name: &str) -> Result<Category>;

  async fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<Option<Category>>;

  /// `IntegrityViolation` while articles still reference the category.
  async fn delete_category(&mut self, id: CategoryId) -> Result<bool>;

  async fn list_categories(&mut self, req: &PageRequest) -> Result<Page<Category>>;
}

lazy_static! {
  static ref CATEGORY_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "categories",
      columns: vec![
        primary("id"),
        column("name"),
        generated("created_at"),
        generated("updated_at"),
      ],
    }
  };

  static ref CATEGORY_BY_ID: String =
    format!("{} WHERE id = $1", CATEGORY_COLUMNS.build_select_query());
  static ref CATEGORY_BY_NAME: String =
    format!("{} WHERE name = $1", CATEGORY_COLUMNS.build_select_query());
  static ref INSERT_CATEGORY: String = CATEGORY_COLUMNS.build_insert_query();
  static ref RENAME_CATEGORY: String =
    CATEGORY_COLUMNS.build_update_query(&["name"], "updated_at = (NOW() AT TIME ZONE 'utc')");
  static ref LIST_CATEGORIES: String =
    format!("{} ORDER BY name, id LIMIT $1 OFFSET $2", CATEGORY_COLUMNS.build_select_query());
}

fn category_from_row(row: &Row) -> Category {
  Category {
    id: row.get(0),
    name: row.get(1),
    created_at: row.get(2),
    updated_at: row.get(3),
  }
}

#[async_trait]
impl CategoryRepository for PgTx {
  async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
    let row = self.query_opt(&CATEGORY_BY_ID, &[&id]).await?;
    Ok(row.as_ref().map(category_from_row))
  }

  async fn find_category_by_name(&mut self, name: &str) -> Result<Option<Category>> {
    let row = self.query_opt(&CATEGORY_BY_NAME, &[&name]).await?;
    Ok(row.as_ref().map(category_from_row))
  }

  async fn insert_category(&mut self, name: &str) -> Result<Category> {
    let row = self.query_one(&INSERT_CATEGORY, &[&name]).await?;
    Ok(category_from_row(&row))
  }

  async fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<Option<Category>> {
    let row = self.query_opt(&RENAME_CATEGORY, &[&name, &id]).await?;
    Ok(row.as_ref().map(category_from_row))
  }

  async fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
    let count = self.execute("DELETE FROM categories WHERE id = $1", &[&id]).await?;
    Ok(count > 0)
  }

  async fn list_categories(&mut self, req: &PageRequest) -> Result<Page<Category>> {
    let rows = self.query(&LIST_CATEGORIES, &[&req.limit(), &req.offset()]).await?;
    let total: i64 = self.query_one("SELECT COUNT(*) FROM categories", &[]).await?.get(0);
    Ok(page_of(rows.iter().map(category_from_row).collect(), req, total))
  }
}

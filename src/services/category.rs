use log::*;

use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::{CategoryName, PageRequest};
use crate::models::*;
use crate::util::normalize_name;
use crate::with_savepoint;

use super::{traced, Paging, Service};

pub const DEFAULT_CATEGORY: &str = "UNCATEGORIZED";

/// Idempotent get-or-create of categories by name.
///
/// A lost insert race shows up as a unique violation; the winner's row is
/// read back instead of failing.
#[derive(Debug, Clone)]
pub struct CategoryResolver {
  default_name: String,
}

impl Default for CategoryResolver {
  fn default() -> Self {
    Self {
      default_name: DEFAULT_CATEGORY.to_string(),
    }
  }
}

impl CategoryResolver {
  pub fn default_name(&self) -> &str {
    &self.default_name
  }

  pub async fn resolve<R>(&self, tx: &mut R, raw: &str) -> Result<Category>
  where
    R: CategoryRepository + Transaction,
  {
    let name = normalize_name(raw);
    CategoryName::new(&name).validate()?;
    if let Some(category) = tx.find_category_by_name(&name).await? {
      return Ok(category);
    }

    let inserted: Result<Category> =
      with_savepoint!(tx, "category_insert", tx.insert_category(&name).await);
    match inserted {
      Ok(category) => {
        info!("Created category {} (id={})", category.name, category.id);
        Ok(category)
      },
      Err(Error::Conflict(_)) => {
        debug!("Category {} created concurrently, reading it back.", name);
        tx.find_category_by_name(&name).await?
          .ok_or_else(|| Error::conflict(format!("category {} vanished after conflict", name)))
      },
      Err(err) => Err(err),
    }
  }

  pub async fn ensure_default<R>(&self, tx: &mut R) -> Result<Category>
  where
    R: CategoryRepository + Transaction,
  {
    self.resolve(tx, &self.default_name).await
  }
}

impl Service for CategoryResolver {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    if let Some(name) = config.get_str("category.default_name")? {
      let name = normalize_name(&name);
      CategoryName::new(&name).validate()?;
      self.default_name = name;
    }
    Ok(())
  }
}

#[derive(Clone)]
pub struct CategoryService<S: Store> {
  store: S,
  resolver: CategoryResolver,
  paging: Paging,
}

impl<S: Store> CategoryService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      resolver: Default::default(),
      paging: Default::default(),
    }
  }

  pub fn resolver(&self) -> &CategoryResolver {
    &self.resolver
  }

  pub async fn resolve(&self, name: &str) -> Result<Category> {
    traced("category.resolve", async {
      let mut tx = self.store.begin().await?;
      let res = self.resolver.resolve(&mut tx, name).await;
      finish(tx, res).await
    }).await
  }

  pub async fn ensure_default(&self) -> Result<Category> {
    traced("category.ensure_default", async {
      let mut tx = self.store.begin().await?;
      let res = self.resolver.ensure_default(&mut tx).await;
      finish(tx, res).await
    }).await
  }

  pub async fn create(&self, form: &CategoryName) -> Result<Category> {
    traced("category.create", async {
      form.validate()?;
      let name = normalize_name(&form.name);
      let mut tx = self.store.begin().await?;
      let res = tx.insert_category(&name).await
        .map_err(|err| match err {
          Error::Conflict(_) => Error::conflict(format!("category {} already exists", name)),
          err => err,
        });
      finish(tx, res).await
    }).await
  }

  pub async fn rename(&self, id: CategoryId, form: &CategoryName) -> Result<Category> {
    traced("category.rename", async {
      form.validate()?;
      let name = normalize_name(&form.name);
      let mut tx = self.store.begin().await?;
      let res = self.rename_in(&mut tx, id, &name).await;
      finish(tx, res).await
    }).await
  }

  async fn rename_in(&self, tx: &mut S::Tx, id: CategoryId, name: &str) -> Result<Category> {
    let current = tx.find_category(id).await?
      .ok_or_else(|| Error::not_found(format!("category {}", id)))?;
    if current.name == self.resolver.default_name() && name != current.name {
      return Err(Error::business("the default category cannot be renamed"));
    }
    match tx.rename_category(id, name).await {
      Ok(Some(category)) => Ok(category),
      Ok(None) => Err(Error::not_found(format!("category {}", id))),
      Err(Error::Conflict(_)) => Err(Error::conflict(format!("category {} already exists", name))),
      Err(err) => Err(err),
    }
  }

  /// Delete a category, moving its articles to the default category first.
  pub async fn delete(&self, id: CategoryId) -> Result<()> {
    traced("category.delete", async {
      let mut tx = self.store.begin().await?;
      let res = self.delete_in(&mut tx, id).await;
      finish(tx, res).await
    }).await
  }

  async fn delete_in(&self, tx: &mut S::Tx, id: CategoryId) -> Result<()> {
    let category = tx.find_category(id).await?
      .ok_or_else(|| Error::not_found(format!("category {}", id)))?;
    if category.name == self.resolver.default_name() {
      return Err(Error::business("the default category cannot be deleted"));
    }
    let fallback = self.resolver.ensure_default(tx).await?;
    let moved = tx.reassign_category(id, fallback.id).await?;
    if moved > 0 {
      info!("Moved {} articles from {} to {}", moved, category.name, fallback.name);
    }
    tx.delete_category(id).await?;
    Ok(())
  }

  pub async fn find(&self, id: CategoryId) -> Result<Category> {
    traced("category.find", async {
      let mut tx = self.store.begin().await?;
      let res = tx.find_category(id).await
        .and_then(|found| found.ok_or_else(|| Error::not_found(format!("category {}", id))));
      finish(tx, res).await
    }).await
  }

  pub async fn list(&self, req: &PageRequest) -> Result<Page<Category>> {
    traced("category.list", async {
      let req = self.paging.clamp(req);
      let mut tx = self.store.begin().await?;
      let res = tx.list_categories(&req).await;
      finish(tx, res).await
    }).await
  }
}

impl<S: Store> Service for CategoryService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.resolver.load_app_config(config)?;
    self.paging.load_app_config(config)?;
    Ok(())
  }
}

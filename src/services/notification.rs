use crate::error::*;
use crate::app::AppConfig;
use crate::db::*;
use crate::forms::PageRequest;
use crate::models::*;

use super::{traced, Paging, Service};

/// Read side of notifications.  Records are only written by `NotificationFanout`.
#[derive(Clone)]
pub struct NotificationService<S: Store> {
  store: S,
  paging: Paging,
}

impl<S: Store> NotificationService<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      paging: Default::default(),
    }
  }

  pub async fn list(&self, user: &User, req: &PageRequest) -> Result<Page<Notification>> {
    traced("notification.list", self.list_filtered(user, false, req)).await
  }

  pub async fn list_unread(&self, user: &User, req: &PageRequest) -> Result<Page<Notification>> {
    traced("notification.list_unread", self.list_filtered(user, true, req)).await
  }

  async fn list_filtered(&self, user: &User, unread_only: bool, req: &PageRequest)
    -> Result<Page<Notification>> {
    let req = self.paging.clamp(req);
    let mut tx = self.store.begin().await?;
    let res = tx.list_notifications(user.id, unread_only, &req).await;
    finish(tx, res).await
  }

  /// Unknown ids and other users' notifications are both `NotFound`.
  pub async fn mark_read(&self, id: NotificationId, user: &User) -> Result<Notification> {
    traced("notification.mark_read", async {
      let mut tx = self.store.begin().await?;
      let res = mark_read_in(&mut tx, id, user).await;
      finish(tx, res).await
    }).await
  }

  pub async fn mark_all_read(&self, user: &User) -> Result<u64> {
    traced("notification.mark_all_read", async {
      let mut tx = self.store.begin().await?;
      let res = tx.mark_all_read(user.id).await;
      finish(tx, res).await
    }).await
  }

  pub async fn unread_count(&self, user: &User) -> Result<i64> {
    traced("notification.unread_count", async {
      let mut tx = self.store.begin().await?;
      let res = tx.count_unread(user.id).await;
      finish(tx, res).await
    }).await
  }
}

async fn mark_read_in<R: NotificationRepository>(tx: &mut R, id: NotificationId, user: &User)
  -> Result<Notification> {
  let mut notification = match tx.find_notification(id).await? {
    Some(n) if n.recipient_id == user.id => n,
    _ => return Err(Error::not_found(format!("notification {}", id))),
  };
  if !notification.read {
    tx.mark_read(id).await?;
    notification.read = true;
  }
  Ok(notification)
}

impl<S: Store> Service for NotificationService<S> {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.paging.load_app_config(config)
  }
}

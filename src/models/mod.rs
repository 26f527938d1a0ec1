pub type UserId = i64;
pub type ArticleId = i64;
pub type CategoryId = i64;
pub type CommentId = i64;
pub type NotificationId = i64;

pub mod user;
pub mod article;
pub mod category;
pub mod comment;
pub mod reaction;
pub mod favorite;
pub mod follow;
pub mod notification;
pub mod page;
pub use self::{
  user::*,
  article::*,
  category::*,
  comment::*,
  reaction::*,
  favorite::*,
  follow::*,
  notification::*,
  page::*,
};

use log::*;

use std::collections::{HashMap, HashSet};

use crate::error::*;
use crate::app::AppConfig;
use crate::models::*;

use super::Service;

/// Turns the flat comment rows of an article into reply trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBuilder {
  /// Deepest reply level kept below a root (root = 0).  `None` keeps everything.
  pub max_depth: Option<usize>,
}

impl ThreadBuilder {
  pub fn new(max_depth: Option<usize>) -> Self {
    Self { max_depth }
  }

  /// Build one tree per root.  `comments` is the article's full comment set,
  /// oldest first; replies keep that order.
  pub fn build(&self, roots: &[Comment], comments: &[Comment]) -> Vec<ThreadedComment> {
    let mut children: HashMap<CommentId, Vec<&Comment>> = HashMap::new();
    for comment in comments.iter() {
      if let Some(parent) = comment.parent_id {
        children.entry(parent).or_default().push(comment);
      }
    }
    roots.iter().map(|root| self.build_tree(root, &children)).collect()
  }

  fn build_tree(&self, root: &Comment, children: &HashMap<CommentId, Vec<&Comment>>)
    -> ThreadedComment {
    // pre-order walk; a comment reached twice would mean a cycle.
    let mut visited: HashSet<CommentId> = HashSet::new();
    visited.insert(root.id);
    let mut order: Vec<&Comment> = Vec::new();
    let mut stack: Vec<(&Comment, usize)> = vec![(root, 0)];
    while let Some((comment, depth)) = stack.pop() {
      order.push(comment);
      if self.max_depth.map_or(false, |max| depth >= max) {
        continue;
      }
      if let Some(replies) = children.get(&comment.id) {
        for reply in replies.iter().rev() {
          if visited.insert(reply.id) {
            stack.push((reply, depth + 1));
          } else {
            warn!("comment {} reached twice under root {}, skipped", reply.id, root.id);
          }
        }
      }
    }

    // descendants come after their ancestors in `order`, so build in reverse.
    let mut built: HashMap<CommentId, ThreadedComment> = HashMap::new();
    for comment in order.iter().rev() {
      let mut node = ThreadedComment::leaf(comment);
      if let Some(replies) = children.get(&comment.id) {
        node.replies = replies.iter().filter_map(|reply| built.remove(&reply.id)).collect();
      }
      built.insert(comment.id, node);
    }
    built.remove(&root.id).unwrap_or_else(|| ThreadedComment::leaf(root))
  }
}

impl Service for ThreadBuilder {
  fn load_app_config(&mut self, config: &AppConfig) -> Result<()> {
    self.max_depth = match config.get_int("comment.max_thread_depth")? {
      Some(depth) if depth < 0 => {
        return Err(Error::invalid("config", "comment.max_thread_depth must not be negative"));
      },
      Some(0) | None => None,
      Some(depth) => Some(depth as usize),
    };
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::NaiveDateTime;

  fn comment(id: CommentId, parent_id: Option<CommentId>) -> Comment {
    let ts = NaiveDateTime::from_timestamp_opt(1_600_000_000 + id, 0).unwrap_or_default();
    Comment {
      id,
      content: format!("comment {}", id),
      author_id: 1,
      article_id: 7,
      parent_id,
      created_at: ts,
      updated_at: ts,
    }
  }

  fn ids(nodes: &[ThreadedComment]) -> Vec<CommentId> {
    nodes.iter().map(|n| n.id).collect()
  }

  /// 1 ─┬─ 3 ── 5 ── 6
  ///    └─ 4
  /// 2
  fn sample() -> Vec<Comment> {
    vec![
      comment(1, None),
      comment(2, None),
      comment(3, Some(1)),
      comment(4, Some(1)),
      comment(5, Some(3)),
      comment(6, Some(5)),
    ]
  }

  fn roots(comments: &[Comment]) -> Vec<Comment> {
    comments.iter().filter(|c| c.parent_id.is_none()).cloned().collect()
  }

  #[test]
  fn builds_unbounded_trees_in_creation_order() {
    let comments = sample();
    let trees = ThreadBuilder::default().build(&roots(&comments), &comments);
    assert_eq!(ids(&trees), vec![1, 2]);
    assert_eq!(ids(&trees[0].replies), vec![3, 4]);
    assert_eq!(ids(&trees[0].replies[0].replies), vec![5]);
    assert_eq!(ids(&trees[0].replies[0].replies[0].replies), vec![6]);
    assert_eq!(trees[0].count(), 5);
    assert_eq!(trees[0].depth(), 3);
    assert!(trees[1].replies.is_empty());
  }

  #[test]
  fn depth_cap_truncates_deeper_replies() {
    let comments = sample();
    let trees = ThreadBuilder::new(Some(2)).build(&roots(&comments), &comments);
    assert_eq!(trees[0].depth(), 2);
    assert!(trees[0].replies[0].replies[0].replies.is_empty());
  }

  #[test]
  fn cycles_do_not_loop() {
    // 10 -> 11 -> 12 -> 11 would be a cycle if it were ever stored.
    let comments = vec![comment(10, None), comment(11, Some(10)), comment(12, Some(11)),
      Comment { parent_id: Some(12), ..comment(11, Some(12)) }];
    let trees = ThreadBuilder::default().build(&roots(&comments), &comments);
    assert_eq!(trees.len(), 1);
    assert!(trees[0].count() <= 3);
  }

  #[test]
  fn zero_depth_config_means_unbounded() {
    let mut builder = ThreadBuilder::new(Some(3));
    let config = AppConfig::from_toml_str("[comment]\nmax_thread_depth = 0").unwrap();
    builder.load_app_config(&config).unwrap();
    assert_eq!(builder.max_depth, None);
  }
}

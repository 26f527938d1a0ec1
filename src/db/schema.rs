use log::*;

use crate::error::*;

use super::PgStore;

/// Idempotent DDL for the whole schema.
pub static SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  id BIGSERIAL PRIMARY KEY,
  username VARCHAR(100) NOT NULL,
  email VARCHAR(120) NOT NULL,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  CONSTRAINT uk_user_username UNIQUE (username),
  CONSTRAINT uk_user_email UNIQUE (email)
);

DO $$ BEGIN
  CREATE TYPE article_status AS ENUM ('DRAFT', 'PUBLISHED');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
  CREATE TYPE reaction_type AS ENUM ('LIKE', 'LOVE', 'LAUGH', 'WOW', 'SAD', 'ANGRY');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS categories (
  id BIGSERIAL PRIMARY KEY,
  name VARCHAR(60) NOT NULL,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  updated_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  CONSTRAINT uk_category_name UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS articles (
  id BIGSERIAL PRIMARY KEY,
  title VARCHAR(200) NOT NULL,
  content TEXT NOT NULL,
  status article_status NOT NULL DEFAULT 'DRAFT',
  author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
  comments_count BIGINT NOT NULL DEFAULT 0 CHECK (comments_count >= 0),
  likes_count BIGINT NOT NULL DEFAULT 0 CHECK (likes_count >= 0),
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  updated_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc')
);
CREATE UNIQUE INDEX IF NOT EXISTS uk_article_author_title ON articles (author_id, LOWER(title));
CREATE INDEX IF NOT EXISTS idx_article_status_created ON articles (status, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_article_category ON articles (category_id);

CREATE TABLE IF NOT EXISTS comments (
  id BIGSERIAL PRIMARY KEY,
  content TEXT NOT NULL,
  author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
  parent_id BIGINT REFERENCES comments(id) ON DELETE CASCADE,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  updated_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc')
);
CREATE INDEX IF NOT EXISTS idx_comment_article ON comments (article_id, created_at, id);
CREATE INDEX IF NOT EXISTS idx_comment_parent ON comments (parent_id);

CREATE TABLE IF NOT EXISTS reactions (
  id BIGSERIAL PRIMARY KEY,
  reaction_type reaction_type NOT NULL,
  user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  updated_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  CONSTRAINT uk_user_article_reaction UNIQUE (user_id, article_id)
);
CREATE INDEX IF NOT EXISTS idx_reaction_article ON reactions (article_id);

CREATE TABLE IF NOT EXISTS favorites (
  id BIGSERIAL PRIMARY KEY,
  user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  CONSTRAINT uk_user_article_favorite UNIQUE (user_id, article_id)
);

CREATE TABLE IF NOT EXISTS follows (
  id BIGSERIAL PRIMARY KEY,
  follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  following_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
  CONSTRAINT uk_follower_following UNIQUE (follower_id, following_id),
  CONSTRAINT ck_follow_not_self CHECK (follower_id <> following_id)
);
CREATE INDEX IF NOT EXISTS idx_follow_following ON follows (following_id, follower_id);

CREATE TABLE IF NOT EXISTS notifications (
  id BIGSERIAL PRIMARY KEY,
  recipient_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
  message VARCHAR(500) NOT NULL,
  is_read BOOLEAN NOT NULL DEFAULT FALSE,
  created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc')
);
CREATE INDEX IF NOT EXISTS idx_notification_recipient ON notifications (recipient_id, is_read, created_at DESC);
"#;

pub async fn migrate(store: &PgStore) -> Result<()> {
  info!("Applying schema.");
  store.batch_execute(SCHEMA).await?;
  info!("Schema up to date.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn schema_names_the_constraints_mapped_to_conflicts() {
    for name in &["uk_category_name", "uk_article_author_title", "uk_user_article_reaction",
        "uk_user_article_favorite", "uk_follower_following"] {
      assert!(SCHEMA.contains(name), "missing constraint {}", name);
    }
  }
}

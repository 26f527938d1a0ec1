use log::*;

use serde::Serialize;
use serde_json::Value as JsonValue;

use thiserror::Error;

use tokio_postgres::error::SqlState;

/// A single failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field: &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}

#[derive(Error, Debug)]
pub enum Error {
  // 404
  #[error("not found: {0}")]
  NotFound(String),

  // 403
  #[error("forbidden: {0}")]
  Forbidden(String),

  // 409
  #[error("conflict: {0}")]
  Conflict(String),

  // 422
  #[error("validation failed: {}", format_fields(.0))]
  Validation(Vec<FieldError>),

  // 400
  #[error("business rule violated: {0}")]
  BusinessRule(String),

  // 409
  #[error("integrity violation: {0}")]
  IntegrityViolation(String),

  // 502
  #[error("disconnected: {0}")]
  Disconnected(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::Error,
  },

  #[error("connection pool error")]
  PoolError {
    #[from]
    source: deadpool_postgres::PoolError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

fn format_fields(fields: &[FieldError]) -> String {
  fields.iter()
    .map(|f| format!("{}: {}", f.field, f.message))
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn not_found(msg: impl Into<String>) -> Self {
    Error::NotFound(msg.into())
  }

  pub fn forbidden(msg: impl Into<String>) -> Self {
    Error::Forbidden(msg.into())
  }

  pub fn conflict(msg: impl Into<String>) -> Self {
    Error::Conflict(msg.into())
  }

  pub fn business(msg: impl Into<String>) -> Self {
    Error::BusinessRule(msg.into())
  }

  pub fn invalid(field: &'static str, msg: impl Into<String>) -> Self {
    Error::Validation(vec![FieldError::new(field, msg)])
  }

  /// Domain errors are expected outcomes of a request; everything else is infrastructure.
  pub fn is_domain(&self) -> bool {
    matches!(self,
      Error::NotFound(_) | Error::Forbidden(_) | Error::Conflict(_) |
      Error::Validation(_) | Error::BusinessRule(_) | Error::IntegrityViolation(_)
    )
  }

  /// Status code the transport layer should answer with.
  pub fn status_code(&self) -> u16 {
    match self {
      Error::NotFound(_) => 404,
      Error::Forbidden(_) => 403,
      Error::Conflict(_) => 409,
      Error::Validation(_) => 422,
      Error::BusinessRule(_) => 400,
      Error::IntegrityViolation(_) => 409,
      Error::Disconnected(_) => 502,
      _ => 500,
    }
  }

  /// Error body for the transport layer.
  pub fn to_json(&self) -> JsonValue {
    match self {
      Error::Validation(fields) => json!({
        "error": "validation failed",
        "errors": fields,
      }),
      Error::NotFound(msg) | Error::Forbidden(msg) | Error::Conflict(msg) |
      Error::BusinessRule(msg) | Error::IntegrityViolation(msg) | Error::Disconnected(msg) => {
        json!({ "error": msg })
      },
      err => {
        error!("InternalServerError: {:?}", err);
        json!({ "error": "Internal Server Error" })
      },
    }
  }

  /// Classify a postgres error raised by `query`.
  pub fn from_pg(err: tokio_postgres::Error, query: &str) -> Self {
    if err.is_closed() {
      return Error::Disconnected("database connection closed".to_string());
    }
    let db_err = match err.as_db_error() {
      Some(db_err) => db_err,
      None => {
        error!("Postgres error: {}, query=[[{}]]", err, query);
        return err.into();
      },
    };
    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
    match db_err.code() {
      code if *code == SqlState::UNIQUE_VIOLATION => Error::Conflict(constraint),
      code if *code == SqlState::FOREIGN_KEY_VIOLATION
        || *code == SqlState::CHECK_VIOLATION => Error::IntegrityViolation(constraint),
      _ => {
        error!("Postgres DB error: {:?}, query=[[{}]]", db_err, query);
        err.into()
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_map_to_client_statuses() {
    assert_eq!(Error::not_found("article").status_code(), 404);
    assert_eq!(Error::forbidden("article").status_code(), 403);
    assert_eq!(Error::conflict("title").status_code(), 409);
    assert_eq!(Error::invalid("title", "too short").status_code(), 422);
    assert_eq!(Error::business("unpublish").status_code(), 400);
    assert_eq!(Error::Disconnected("db".into()).status_code(), 502);
    assert!(Error::business("x").is_domain());
    assert!(!Error::Disconnected("db".into()).is_domain());
  }

  #[test]
  fn validation_body_lists_every_field() {
    let err = Error::Validation(vec![
      FieldError::new("title", "must not be blank"),
      FieldError::new("content", "must have at least 10 characters"),
    ]);
    let body = err.to_json();
    assert_eq!(body["errors"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(
      err.to_string(),
      "validation failed: title: must not be blank, content: must have at least 10 characters"
    );
  }

  #[test]
  fn internal_errors_hide_details() {
    let err = Error::Other(anyhow::anyhow!("secret detail"));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.to_json(), json!({ "error": "Internal Server Error" }));
  }
}

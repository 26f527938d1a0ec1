use chrono::NaiveDateTime;

/// Current time as stored in the database (UTC, no zone).
pub fn now() -> NaiveDateTime {
  chrono::Utc::now().naive_utc()
}

/// `Some(trimmed)` when the value is present and not blank.
pub fn non_blank(val: &Option<String>) -> Option<&str> {
  match val {
    Some(val) if !val.trim().is_empty() => Some(val.trim()),
    _ => None,
  }
}

/// Category names are compared and stored trimmed and upper-cased.
pub fn normalize_name(name: &str) -> String {
  name.trim().to_uppercase()
}

pub fn char_len(val: &str) -> usize {
  val.chars().count()
}

use serde::de::Deserialize;

use clap::ArgMatches;
use config::{Config, ConfigError, Environment, File, FileFormat, Value};

use crate::error::*;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub conf: Config
}

impl AppConfig {
  pub fn new_clap(cli: &ArgMatches) -> Result<Self> {
    // Load defaults
    let mut builder = Config::builder()
      .add_source(File::with_name("conf/default").required(false));

    if let Some(config_file) = cli.value_of("config") {
      builder = builder.add_source(File::with_name(config_file));
    } else {
      // Get RUN_MODE from environment
      let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
      builder = builder.add_source(File::with_name(&format!("conf/{}", env)).required(false));
    }

    // Allow overrides from environment, e.g. APP_DB__URL
    let conf = builder
      .add_source(Environment::with_prefix("app").separator("__"))
      .build()?;

    Ok(AppConfig {
      conf,
    })
  }

  /// Build from an inline TOML document.
  pub fn from_toml_str(toml: &str) -> Result<Self> {
    let conf = Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()?;
    Ok(AppConfig {
      conf,
    })
  }

  pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
    match self.conf.get(key) {
      Ok(val) => Ok(Some(val)),
      Err(ConfigError::NotFound(_)) => Ok(None),
      Err(err) => Err(err.into()),
    }
  }

  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_string()?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_int()?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_bool()?)
    } else {
      None
    };
    Ok(val)
  }

  /// Integer setting that must be positive.
  pub fn get_positive(&self, key: &str, default: i64) -> Result<i64> {
    match self.get_int(key)? {
      Some(val) if val > 0 => Ok(val),
      Some(val) => Err(Error::invalid("config", format!("{} must be positive, got {}", key, val))),
      None => Ok(default),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_keys_are_none() {
    let config = AppConfig::from_toml_str("[db]\nurl = \"postgres://localhost/verso\"").unwrap();
    assert_eq!(config.get_str("db.url").unwrap().as_deref(), Some("postgres://localhost/verso"));
    assert_eq!(config.get_int("db.pool_size").unwrap(), None);
    assert_eq!(config.get_bool("db.tls").unwrap(), None);
  }

  #[test]
  fn positive_settings_fall_back_to_default() {
    let config = AppConfig::from_toml_str("[notification]\nfanout_page_size = 0").unwrap();
    assert!(config.get_positive("notification.fanout_page_size", 500).is_err());
    assert_eq!(config.get_positive("page.max_size", 100).unwrap(), 100);
  }
}

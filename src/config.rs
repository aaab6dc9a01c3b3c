use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_PATH: &str = "data/entity-pages.db";
const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_DATABASE_PATH: &str = "ENTITY_PAGES_DB_PATH";
pub const ENV_LOG_DIR: &str = "ENTITY_PAGES_LOG_DIR";
pub const ENV_LOG_FILTER: &str = "ENTITY_PAGES_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|error| AppError::Io(format!("{}: {}", path.to_string_lossy(), error)))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(path) = non_empty(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = non_empty(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = non_empty(ENV_LOG_FILTER) {
            self.log_filter = filter;
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(AppError::InvalidInput("databasePath must not be empty".to_string()));
        }
        if self.log_filter.trim().is_empty() {
            return Err(AppError::InvalidInput("logFilter must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceConfig, ENV_DATABASE_PATH, ENV_LOG_DIR, ENV_LOG_FILTER};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "databasePath": "/var/lib/team/pages.db" }"#).expect("write");

        let config = ServiceConfig::load(&path).expect("load");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/team/pages.db"));
        assert_eq!(config.log_filter, "info");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn load_rejects_blank_database_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "databasePath": "" }"#).expect("write");
        assert!(ServiceConfig::load(&path).is_err());
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let vars = HashMap::from([
            (ENV_DATABASE_PATH, "/tmp/pages.db"),
            (ENV_LOG_DIR, " "),
            (ENV_LOG_FILTER, "entity_pages=debug"),
        ]);
        let mut config = ServiceConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|value| value.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/pages.db"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.log_filter, "entity_pages=debug");
    }

    #[test]
    fn from_env_reads_process_variables() {
        std::env::set_var(ENV_DATABASE_PATH, "/srv/team/pages.db");
        std::env::set_var(ENV_LOG_FILTER, "warn");
        std::env::remove_var(ENV_LOG_DIR);
        let config = ServiceConfig::from_env();
        std::env::remove_var(ENV_DATABASE_PATH);
        std::env::remove_var(ENV_LOG_FILTER);

        let config = config.expect("config");
        assert_eq!(config.database_path, PathBuf::from("/srv/team/pages.db"));
        assert_eq!(config.log_filter, "warn");
        assert!(config.log_dir.is_none());
    }
}

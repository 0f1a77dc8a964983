use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 12;

const APP_DIR: &str = "telegram-search-client";
const DB_FILENAME: &str = "client.db";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined under. Always ends in `/`.
    pub api_root: String,
    /// Upper bound for a single request, in seconds.
    pub timeout_secs: u64,
    /// Initial page size for new sessions.
    pub page_size: usize,
    /// Directory holding the local database and log files.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `BTTS_API_ROOT`, `BTTS_TIMEOUT_SECS`,
    /// `BTTS_PAGE_SIZE` and `BTTS_DATA_DIR`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(root) = lookup("BTTS_API_ROOT") {
            config.api_root = root;
        }
        if let Some(secs) = lookup("BTTS_TIMEOUT_SECS") {
            config.timeout_secs = secs
                .parse()
                .map_err(|_| AppError::Config(format!("invalid BTTS_TIMEOUT_SECS: {}", secs)))?;
        }
        if let Some(size) = lookup("BTTS_PAGE_SIZE") {
            config.page_size = size
                .parse()
                .map_err(|_| AppError::Config(format!("invalid BTTS_PAGE_SIZE: {}", size)))?;
        }
        if let Some(dir) = lookup("BTTS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<(), AppError> {
        if self.api_root.trim().is_empty() {
            return Err(AppError::Config("API root must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(AppError::Config("page size must be positive".to_string()));
        }
        if !self.api_root.ends_with('/') {
            self.api_root.push('/');
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.page_size, 12);
        assert!(config.api_root.ends_with('/'));
        assert!(config.db_path().to_string_lossy().contains(APP_DIR));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("BTTS_API_ROOT", "https://search.example.org/api"),
            ("BTTS_TIMEOUT_SECS", "5"),
            ("BTTS_PAGE_SIZE", "20"),
            ("BTTS_DATA_DIR", "/tmp/btts"),
        ]))
        .unwrap();
        assert_eq!(config.api_root, "https://search.example.org/api/");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/btts/client.db"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[("BTTS_PAGE_SIZE", "lots")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = ClientConfig::from_lookup(lookup_from(&[("BTTS_PAGE_SIZE", "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

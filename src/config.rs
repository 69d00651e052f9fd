use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::view::OrderingStrategy;

const DEFAULT_DB_PATH: &str = "tbr.db";
const DEFAULT_STORAGE_KEY: &str = "tbr.books";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 6;
const DEFAULT_OPENLIBRARY_URL: &str = "https://openlibrary.org";
const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";
const DEFAULT_GOODREADS_URL: &str = "https://www.goodreads.com";
const HTTP_USER_AGENT: &str = "tbr/0.1 (reading list)";

#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub openlibrary_url: String,
    pub covers_url: String,
    pub goodreads_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub debug: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        MetadataConfig {
            openlibrary_url: DEFAULT_OPENLIBRARY_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            goodreads_url: DEFAULT_GOODREADS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: HTTP_USER_AGENT.to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub storage_key: String,
    pub ordering: OrderingStrategy,
    pub metadata: MetadataConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            ordering: OrderingStrategy::Curated,
            metadata: MetadataConfig::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `TBR_*` environment variables. Unparseable
    /// values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("TBR_DB_PATH").and_then(non_blank) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(key) = lookup("TBR_STORAGE_KEY").and_then(non_blank) {
            config.storage_key = key;
        }
        if let Some(raw) = lookup("TBR_ORDERING").and_then(non_blank) {
            match OrderingStrategy::from_str(&raw) {
                Ok(ordering) => config.ordering = ordering,
                Err(err) => log::warn!("ignoring TBR_ORDERING: {}", err),
            }
        }
        if let Some(raw) = lookup("TBR_HTTP_TIMEOUT_SECS").and_then(non_blank) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.metadata.timeout = Duration::from_secs(secs),
                _ => log::warn!("ignoring TBR_HTTP_TIMEOUT_SECS={}", raw),
            }
        }
        if let Some(url) = lookup("TBR_OPENLIBRARY_URL").and_then(non_blank) {
            config.metadata.openlibrary_url = trim_base(&url);
        }
        if let Some(url) = lookup("TBR_COVERS_URL").and_then(non_blank) {
            config.metadata.covers_url = trim_base(&url);
        }
        if let Some(url) = lookup("TBR_GOODREADS_URL").and_then(non_blank) {
            config.metadata.goodreads_url = trim_base(&url);
        }
        config.metadata.debug = lookup("TBR_METADATA_DEBUG")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        config
    }
}

fn is_truthy(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    lowered == "1" || lowered == "true" || lowered == "yes" || lowered == "on"
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::view::OrderingStrategy;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.storage_key, "tbr.books");
        assert_eq!(config.ordering, OrderingStrategy::Curated);
        assert_eq!(config.metadata.timeout, Duration::from_secs(6));
        assert!(!config.metadata.debug);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("TBR_ORDERING", "sorted"),
            ("TBR_HTTP_TIMEOUT_SECS", "2"),
            ("TBR_OPENLIBRARY_URL", "http://localhost:9000/"),
            ("TBR_METADATA_DEBUG", "Yes"),
        ]);
        assert_eq!(config.ordering, OrderingStrategy::Sorted);
        assert_eq!(config.metadata.timeout, Duration::from_secs(2));
        assert_eq!(config.metadata.openlibrary_url, "http://localhost:9000");
        assert!(config.metadata.debug);
    }

    #[test]
    fn ignores_invalid_values() {
        let config = config_from(&[("TBR_ORDERING", "random"), ("TBR_HTTP_TIMEOUT_SECS", "0")]);
        assert_eq!(config.ordering, OrderingStrategy::Curated);
        assert_eq!(config.metadata.timeout, Duration::from_secs(6));
    }
}

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::query::paginate::DEFAULT_PAGE_SIZE;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIG_FILE: &str = "scanview.toml";

const ENV_SERVER_URL: &str = "SCANVIEW_SERVER_URL";
const ENV_TIMEOUT_SECS: &str = "SCANVIEW_TIMEOUT_SECS";
const ENV_PAGE_SIZE: &str = "SCANVIEW_PAGE_SIZE";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server_url: String,
    pub timeout_secs: u64,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolve the effective configuration: file, then environment, then the
/// `--server` flag. An explicit `--config` path must exist; the default
/// `./scanview.toml` is optional.
pub fn load_config(explicit: Option<&Path>, server_override: Option<&str>) -> Result<Config> {
    load_with_env(explicit, server_override, |key| std::env::var(key).ok())
}

fn load_with_env(
    explicit: Option<&Path>,
    server_override: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => load_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                load_file(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(url) = env(ENV_SERVER_URL) {
        config.server_url = url;
    }
    if let Some(raw) = env(ENV_TIMEOUT_SECS) {
        config.timeout_secs = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", ENV_TIMEOUT_SECS, raw))?;
    }
    if let Some(raw) = env(ENV_PAGE_SIZE) {
        config.page_size = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", ENV_PAGE_SIZE, raw))?;
    }
    if let Some(url) = server_override {
        config.server_url = url.to_string();
    }

    validate_config(&config)?;
    debug!(
        server = %config.server_url,
        timeout = config.timeout_secs,
        page_size = config.page_size,
        "configuration loaded"
    );
    Ok(config)
}

fn load_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn validate_config(config: &Config) -> Result<()> {
    let url = Url::parse(&config.server_url)
        .with_context(|| format!("Invalid server URL: {}", config.server_url))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "Server URL must use http or https: {}",
        config.server_url
    );
    ensure!(config.timeout_secs > 0, "Timeout must be at least 1 second");
    ensure!(config.page_size > 0, "Page size must be greater than zero");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config_file(
            r#"
server_url = "https://scans.example.com/api"
timeout_secs = 5
page_size = 25
"#,
        );
        let config = load_with_env(Some(file.path()), None, no_env).unwrap();
        assert_eq!(config.server_url, "https://scans.example.com/api");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config_file("page_size = 50\n");
        let config = load_with_env(Some(file.path()), None, no_env).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config_file("server = \"http://x\"\n");
        let err = load_with_env(Some(file.path()), None, no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_with_env(Some(Path::new("/nonexistent/scanview.toml")), None, no_env)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_env_then_flag_precedence() {
        let file = write_config_file("server_url = \"http://from-file:8000/api\"\n");
        let env: HashMap<&str, &str> = [
            (ENV_SERVER_URL, "http://from-env:8000/api"),
            (ENV_TIMEOUT_SECS, "7"),
            (ENV_PAGE_SIZE, "100"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = load_with_env(Some(file.path()), None, lookup).unwrap();
        assert_eq!(config.server_url, "http://from-env:8000/api");
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(config.page_size, 100);

        let config =
            load_with_env(Some(file.path()), Some("http://from-flag/api"), lookup).unwrap();
        assert_eq!(config.server_url, "http://from-flag/api");
    }

    #[test]
    fn test_invalid_env_number() {
        let file = write_config_file("");
        let lookup = |key: &str| (key == ENV_PAGE_SIZE).then(|| "ten".to_string());
        let err = load_with_env(Some(file.path()), None, lookup).unwrap_err();
        assert!(err.to_string().contains(ENV_PAGE_SIZE));
    }

    #[test]
    fn test_validation() {
        let file = write_config_file("server_url = \"ftp://example.com\"\n");
        let err = load_with_env(Some(file.path()), None, no_env).unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let file = write_config_file("timeout_secs = 0\n");
        assert!(load_with_env(Some(file.path()), None, no_env).is_err());

        let file = write_config_file("page_size = 0\n");
        let err = load_with_env(Some(file.path()), None, no_env).unwrap_err();
        assert!(err.to_string().contains("Page size"));
    }
}

//! Client configuration.
//!
//! Defaults, overridden by `careboard.toml` (when present), overridden by env vars:
//! - `CAREBOARD_API_URL` / `api_url`
//! - `CAREBOARD_TIMEOUT_SECS` / `timeout_secs`
//! - `CAREBOARD_DEFAULT_STATUS` / `default_status`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::{ContainerKey, UnknownContainer};

pub const CONFIG_FILE: &str = "careboard.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    File(#[from] toml::de::Error),

    #[error("invalid api url {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),

    #[error(transparent)]
    InvalidStatus(#[from] UnknownContainer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// 追加先の列を指定しなかったときに使う
    pub default_status: ContainerKey,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL)
                .unwrap_or_else(|_| unreachable!("default api url is valid")),
            request_timeout: Duration::from_secs(10),
            default_status: ContainerKey::Todo,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    default_status: Option<ContainerKey>,
}

impl ClientConfig {
    /// `./careboard.toml` と実際の環境変数から読む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Path::new(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_config_file(path)?;
        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// ファイル内容と環境変数の参照関数から組み立てる
    pub fn from_sources(
        file_contents: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(contents) = file_contents {
            let file: FileConfig = toml::from_str(contents)?;
            if let Some(value) = file.api_url {
                config.base_url = parse_url(&value)?;
            }
            if let Some(secs) = file.timeout_secs {
                config.request_timeout = Duration::from_secs(secs);
            }
            if let Some(status) = file.default_status {
                config.default_status = status;
            }
        }

        if let Some(value) = lookup("CAREBOARD_API_URL") {
            config.base_url = parse_url(&value)?;
        }
        if let Some(value) = lookup("CAREBOARD_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("CAREBOARD_DEFAULT_STATUS") {
            config.default_status = value.trim().parse()?;
        }

        Ok(config)
    }
}

/// 設定ファイルが無ければ None
fn read_config_file(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

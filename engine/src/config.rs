use serde::Deserialize;
use std::path::{Path, PathBuf};

use anvil_client::DEFAULT_DAEMON_URL;
use anvil_types::ui::UiOptions;

/// Environment variable overriding the daemon address. Highest precedence.
pub const DAEMON_URL_ENV: &str = "ANVIL_DAEMON_URL";

/// `~/.anvil/config.toml`, all sections optional.
#[derive(Debug, Default, Deserialize)]
pub struct AnvilConfig {
    pub daemon: Option<DaemonSection>,
    pub ui: Option<UiSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DaemonSection {
    /// Daemon base URL, e.g. "http://localhost:3046".
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiSection {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze spinners and other animated elements.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl AnvilConfig {
    /// Load the config file. `Ok(None)` when there is no home directory or
    /// no file; an unreadable or invalid file is an error the caller can
    /// report before falling back to defaults.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".anvil").join("config.toml"))
}

/// Daemon address to use, by precedence: `ANVIL_DAEMON_URL`, then the config
/// file, then the built-in default. Values that do not parse as URLs are
/// skipped with a warning rather than handed to the HTTP client.
#[must_use]
pub fn resolve_daemon_url(config: Option<&AnvilConfig>) -> String {
    let env_value = std::env::var(DAEMON_URL_ENV).ok();
    let file_value = config
        .and_then(|c| c.daemon.as_ref())
        .and_then(|d| d.base_url.clone());
    resolve_daemon_url_from(env_value, file_value)
}

/// Rendering preferences from the config file's `[ui]` section, defaults
/// when the section or the file is absent.
#[must_use]
pub fn resolve_ui_options(config: Option<&AnvilConfig>) -> UiOptions {
    let ui = config.and_then(|cfg| cfg.ui.as_ref());
    UiOptions {
        ascii_only: ui.is_some_and(|cfg| cfg.ascii_only),
        high_contrast: ui.is_some_and(|cfg| cfg.high_contrast),
        reduced_motion: ui.is_some_and(|cfg| cfg.reduced_motion),
    }
}

fn resolve_daemon_url_from(env_value: Option<String>, file_value: Option<String>) -> String {
    let candidates = [
        (env_value, DAEMON_URL_ENV),
        (file_value, "config daemon.base_url"),
    ];
    for (value, origin) in candidates {
        let Some(value) = value else { continue };
        match url::Url::parse(&value) {
            Ok(_) => return value,
            Err(err) => {
                tracing::warn!(%value, origin, "ignoring invalid daemon URL: {err}");
            }
        }
    }
    DEFAULT_DAEMON_URL.to_string()
}

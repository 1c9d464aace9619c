//! Configuration loading and root folder resolution

use crate::cache::DEFAULT_CAPPED_LIMIT_BYTES;
use crate::datasets::DatasetKey;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Remote webhook host serving the nine datasets
pub const DEFAULT_BASE_URL: &str = "https://mariagomez1.app.n8n.cloud/webhook";

/// Default listen address of the review service
pub const DEFAULT_BIND: &str = "127.0.0.1:5730";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MATRICULAS_ROOT";

/// Account seeded with the `root` role at startup
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RootUserConfig {
    pub email: String,
    pub password: String,
}

/// Dashboard configuration read from `config.toml`
///
/// Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL the dataset endpoint paths are appended to
    pub base_url: String,
    /// Per-dataset URL overrides
    pub endpoints: HashMap<DatasetKey, String>,
    /// Per-value ceiling of the capped cache tier
    pub capped_tier_limit_bytes: usize,
    /// Listen address of the review service
    pub bind: String,
    /// Folder holding the database
    pub root_folder: Option<PathBuf>,
    pub root_user: Option<RootUserConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: HashMap::new(),
            capped_tier_limit_bytes: DEFAULT_CAPPED_LIMIT_BYTES,
            bind: DEFAULT_BIND.to_string(),
            root_folder: None,
            root_user: None,
        }
    }
}

impl DashboardConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load an explicit config file, else the platform config file, else defaults
    ///
    /// An explicitly named file must exist and parse. A missing platform file
    /// only logs a warning.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            _ => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capped_tier_limit_bytes == 0 {
            return Err(Error::Config("capped_tier_limit_bytes must be positive".to_string()));
        }
        for url in std::iter::once(&self.base_url).chain(self.endpoints.values()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!("Not an http(s) URL: {}", url)));
            }
        }
        if let Some(root) = &self.root_user {
            if root.email.trim().is_empty() || root.password.is_empty() {
                return Err(Error::Config("root_user needs email and password".to_string()));
            }
        }
        Ok(())
    }

    /// Endpoint URL for a dataset, honoring overrides
    pub fn endpoint_url(&self, key: DatasetKey) -> String {
        match self.endpoints.get(&key) {
            Some(url) => url.clone(),
            None => format!("{}/{}", self.base_url.trim_end_matches('/'), key.endpoint_path()),
        }
    }

    /// Endpoint URLs for all nine datasets
    pub fn endpoint_map(&self) -> HashMap<DatasetKey, String> {
        DatasetKey::ALL
            .iter()
            .map(|&key| (key, self.endpoint_url(key)))
            .collect()
    }
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. Environment variable `MATRICULAS_ROOT`
/// 3. `root_folder` from the config file
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&str>, config: &DashboardConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Platform config file location: `<config dir>/matriculas/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("matriculas").join("config.toml"))
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/matriculas (or /var/lib/matriculas for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("matriculas"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/matriculas"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("matriculas"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/matriculas"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("matriculas"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\matriculas"))
    } else {
        PathBuf::from("./matriculas_data")
    }
}

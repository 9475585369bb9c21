use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest allowed polling interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("unraid-mirror"))
}

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// State file used when no config file exists
pub fn default_state_path() -> PathBuf {
    expand(&default_state_file())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// GraphQL endpoint, e.g. `http://tower.local/graphql`
    pub endpoint: String,

    /// API key; `UNRAID_API_KEY` / `--api-key` take precedence
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Where the mirrored object tree is persisted
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Selected category ids; empty selects the defaults
    #[serde(default)]
    pub categories: Vec<String>,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    15
}

fn default_state_file() -> String {
    "~/.local/state/unraid-mirror/objects.json".to_string()
}

impl Settings {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        settings.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Reject settings the daemon cannot run with
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            bail!("endpoint must not be empty");
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!("endpoint must be an http(s) URL, got '{endpoint}'");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.state_file.trim().is_empty() {
            bail!("state_file must not be empty");
        }
        Ok(())
    }

    /// Polling interval, raised to the minimum if configured lower
    pub fn poll_interval(&self) -> Duration {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            log::warn!(
                "poll_interval_secs = {} is below the minimum, using {MIN_POLL_INTERVAL_SECS}",
                self.poll_interval_secs
            );
        }
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get expanded state file path
    pub fn state_path(&self) -> PathBuf {
        expand(&self.state_file)
    }

    /// Resolve the API key: explicit override first, then the config file
    pub fn api_key(&self, override_key: Option<&str>) -> Result<String> {
        override_key
            .or(self.api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .context("No API key configured (set api_key, UNRAID_API_KEY or --api-key)")
    }
}

// ============================================================================
// Tests
// ============================================================================

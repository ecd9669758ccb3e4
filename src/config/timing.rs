use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "peermark.toml";

const DEFAULT_SOON_WINDOW_SECS: i64 = 24 * 60 * 60;
const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 2_000;

/// Tunables read from `peermark.toml` in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How far ahead of an opening a period is reported as "open soon".
    pub soon_window_secs: i64,
    /// Upper bound on a single token verification.
    pub verify_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            soon_window_secs: DEFAULT_SOON_WINDOW_SECS,
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
        }
    }
}

impl TimingConfig {
    /// Loads `peermark.toml` from `data_dir`, falling back to defaults when absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: TimingConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        if config.soon_window_secs < 0 {
            return Err(Error::Config(
                "soon_window_secs cannot be negative".to_string(),
            ));
        }
        if config.verify_timeout_ms == 0 {
            return Err(Error::Config(
                "verify_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    #[must_use]
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

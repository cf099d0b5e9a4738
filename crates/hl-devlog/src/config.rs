use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::DevLogError;

/// Shared dev log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevLogConfig {
    /// Log file shared by all processes; `<path>.lock` is used as its lock file.
    pub path: PathBuf,
    /// Maximum number of entries retained on disk and in memory.
    pub max_logs: usize,
    /// Debounce window between the first queued entry and the flush.
    pub flush_debounce_ms: u64,
    /// Producer identifier written with every entry. Detected from the executable when unset.
    pub origin: Option<String>,
}

impl Default for DevLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("state/dev.log"),
            max_logs: 500,
            flush_debounce_ms: 500,
            origin: None,
        }
    }
}

impl DevLogConfig {
    /// Config with default limits writing to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }

    pub fn validate(&self) -> Result<(), DevLogError> {
        if self.max_logs == 0 {
            return Err(DevLogError::InvalidConfig("max_logs cannot be zero".into()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(DevLogError::InvalidConfig("path cannot be empty".into()));
        }
        Ok(())
    }
}

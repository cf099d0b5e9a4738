use std::path::PathBuf;

use hl_devlog::DevLogConfig;
use hl_model::{DEFAULT_POOL_CAPACITY, DEFAULT_SLOT_COUNT};
use serde::{Deserialize, Serialize};

use crate::{error::CoreError, slot::DEFAULT_STATE_KEY};

/// Launcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Number of container slots shared by all processes.
    pub slots: usize,
    /// Live engine instances kept per process.
    pub pool_capacity: usize,
    /// Directory of the persisted key-value store.
    pub store_dir: PathBuf,
    /// Store key of the slot table.
    pub state_key: String,
    pub devlog: DevLogConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            store_dir: PathBuf::from("state"),
            state_key: DEFAULT_STATE_KEY.to_string(),
            devlog: DevLogConfig::default(),
        }
    }
}

impl LauncherConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slots == 0 {
            return Err(CoreError::Config("slots must be at least 1".into()));
        }
        if self.pool_capacity == 0 {
            return Err(CoreError::Config("pool_capacity must be at least 1".into()));
        }
        if self.state_key.is_empty() {
            return Err(CoreError::Config("state_key cannot be empty".into()));
        }
        self.devlog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = LauncherConfig::default();
        assert_eq!(cfg.slots, 5);
        assert_eq!(cfg.pool_capacity, 5);
        assert_eq!(cfg.state_key, "pool_state");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: LauncherConfig =
            serde_json::from_str(r#"{"slots": 3, "devlog": {"max_logs": 20}}"#).unwrap();
        assert_eq!(cfg.slots, 3);
        assert_eq!(cfg.pool_capacity, 5);
        assert_eq!(cfg.devlog.max_logs, 20);
        assert_eq!(cfg.devlog.flush_debounce_ms, 500);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let cfg = LauncherConfig {
            slots: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));

        let cfg = LauncherConfig {
            pool_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }
}

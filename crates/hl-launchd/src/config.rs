use std::{env, fs, path::PathBuf};

use anyhow::Context;
use hl_core::LauncherConfig;
use hl_observe::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "HL_CONFIG";

/// Daemon configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logger: LoggerConfig,
    pub launcher: LauncherConfig,
    /// Directory holding the `.html` content files.
    pub content_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read the file named by `HL_CONFIG`, or use defaults when it is unset.
    pub fn load() -> anyhow::Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: PathBuf) -> anyhow::Result<Self> {
        let raw = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        cfg.launcher.validate()?;
        Ok(cfg)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| self.launcher.store_dir.join("content"))
    }
}

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::object::{LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `"info"` or `"hl_core=debug,info"`.
    pub level: LoggerLevel,
    /// Timezone of text and json timestamps.
    pub tz: LoggerTimeZone,
    /// Print event targets.
    pub with_targets: bool,
    /// Color text output when stdout is a terminal.
    pub use_color: bool,
    /// Copy events into the shared dev log when one is passed to the initializer.
    pub mirror_devlog: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
            mirror_devlog: true,
        }
    }
}

impl LoggerConfig {
    /// Color is used only when enabled and stdout is a terminal.
    ///
    /// Evaluated at initialization, not at parse time.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config: LoggerConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.format, LoggerFormat::Text);
        assert_eq!(config.tz, LoggerTimeZone::Utc);
        assert_eq!(config.level.as_str(), "info");
        assert!(config.with_targets);
        assert!(config.mirror_devlog);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: LoggerConfig =
            serde_json::from_str(r#"{"format": "json", "level": "hl_core=debug,warn", "mirror_devlog": false}"#)
                .unwrap();

        assert_eq!(config.format, LoggerFormat::Json);
        assert_eq!(config.level.as_str(), "hl_core=debug,warn");
        assert!(!config.mirror_devlog);
        assert!(config.use_color);
    }

    #[test]
    fn invalid_filter_is_a_parse_error() {
        let parsed = serde_json::from_str::<LoggerConfig>(r#"{"level": "hl_core=loud"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn color_is_off_when_disabled() {
        let config = LoggerConfig {
            use_color: false,
            ..Default::default()
        };
        assert!(!config.should_use_color());
    }
}

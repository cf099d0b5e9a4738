use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::LoggerError;

/// Validated `EnvFilter` expression, kept as text so it can be serialized back.
///
/// The expression is checked with `EnvFilter::try_new` whenever it is parsed from
/// configuration, so a `LoggerLevel` in hand always builds a filter.
///
/// # Examples
/// ```
/// use hl_observe::LoggerLevel;
///
/// let level: LoggerLevel = "hl_core=debug,info".parse().unwrap();
/// assert_eq!(level.as_str(), "hl_core=debug,info");
/// assert!("hl_core=chatty".parse::<LoggerLevel>().is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// Validate `expr` and wrap it.
    ///
    /// # Examples
    /// ```
    /// use hl_observe::LoggerLevel;
    ///
    /// let level = LoggerLevel::new("warn").unwrap();
    /// assert_eq!(level.as_str(), "warn");
    /// ```
    pub fn new(expr: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(expr.into())
    }

    /// The expression exactly as configured.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the filter. Falls back to `info` if the expression stopped parsing.
    ///
    /// # Examples
    /// ```
    /// use hl_observe::LoggerLevel;
    ///
    /// let level: LoggerLevel = "hl_devlog::diag=warn,info".parse().unwrap();
    /// let _filter = level.to_env_filter();
    /// ```
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.0).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;
    fn try_from(expr: String) -> Result<Self, Self::Error> {
        EnvFilter::try_new(&expr)
            .map(|_| LoggerLevel(expr.clone()))
            .map_err(|e| LoggerError::InvalidLevel(format!("{expr}: {e}")))
    }
}

impl From<LoggerLevel> for String {
    fn from(level: LoggerLevel) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_directive_filters() {
        for expr in ["info", "trace", "hl_core=debug,info", "hl_devlog::diag=warn,info"] {
            assert!(
                expr.parse::<LoggerLevel>().is_ok(),
                "expected {expr:?} to be accepted"
            );
        }
    }

    #[test]
    fn rejects_unknown_levels() {
        for expr in ["hl_core=chatty", "a=info,b=nope"] {
            assert!(matches!(
                expr.parse::<LoggerLevel>(),
                Err(LoggerError::InvalidLevel(_))
            ));
        }
    }

    #[test]
    fn serde_keeps_the_expression() {
        let level: LoggerLevel = serde_json::from_str(r#""hl_store=trace,warn""#).unwrap();
        assert_eq!(level.as_str(), "hl_store=trace,warn");
        assert_eq!(serde_json::to_string(&level).unwrap(), r#""hl_store=trace,warn""#);
    }

    #[test]
    fn default_builds_a_filter() {
        let level = LoggerLevel::default();
        assert_eq!(level.as_str(), "info");
        let _ = level.to_env_filter();
    }
}

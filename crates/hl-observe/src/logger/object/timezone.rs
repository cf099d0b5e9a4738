use std::{fmt, str::FromStr, sync::OnceLock};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::LoggerError;

/// Local offset, detected once.
static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Timezone of log timestamps.
///
/// `Local` uses the offset cached by [`init_local_offset`]; timestamps are RFC 3339 in
/// both cases.
///
/// # Examples
/// ```
/// use hl_observe::LoggerTimeZone;
///
/// let tz: LoggerTimeZone = "Local".parse().unwrap();
/// assert_eq!(tz, LoggerTimeZone::Local);
/// assert_eq!(LoggerTimeZone::default().to_string(), "utc");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    /// Offset of the host, detected once per process.
    Local,
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        })
    }
}

/// Detect and cache the local offset.
///
/// Call from `main` before the tokio runtime starts: detection fails on most Unix
/// platforms once the process has more than one thread. Falls back to UTC.
///
/// ```no_run
/// fn main() {
///     hl_observe::init_local_offset();
///     // build the runtime afterwards
/// }
/// ```
pub fn init_local_offset() {
    let _ = LOCAL_OFFSET.set(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));
}

/// Cached local offset; detects lazily when [`init_local_offset`] was not called.
pub(crate) fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| {
        UtcOffset::current_local_offset().unwrap_or_else(|_| {
            eprintln!(
                "hl-observe: local timezone detection failed, using UTC; \
                 call init_local_offset() before starting threads"
            );
            UtcOffset::UTC
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_zones() {
        assert_eq!("UTC".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Utc);
        assert_eq!("local".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Local);
        assert!("pst".parse::<LoggerTimeZone>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&LoggerTimeZone::Local).unwrap(), r#""local""#);
        let tz: LoggerTimeZone = serde_json::from_str(r#""utc""#).unwrap();
        assert_eq!(tz, LoggerTimeZone::Utc);
    }

    #[test]
    fn offset_is_plausible_after_init() {
        init_local_offset();
        assert!(local_offset().whole_hours().abs() <= 14);
    }
}

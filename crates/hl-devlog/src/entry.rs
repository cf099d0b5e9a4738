use std::{fmt, str::FromStr};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::DevLogError;

/// Field separator of the on-disk line format.
const SEP: char = '|';

/// Severity of a dev log entry, stored as a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Single-letter code used on disk and in exports.
    pub fn letter(&self) -> char {
        match self {
            LogLevel::Debug => 'D',
            LogLevel::Info => 'I',
            LogLevel::Warn => 'W',
            LogLevel::Error => 'E',
        }
    }
}

impl FromStr for LogLevel {
    type Err = DevLogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "debug" | "trace" => Ok(LogLevel::Debug),
            "i" | "info" => Ok(LogLevel::Info),
            "w" | "warn" | "warning" => Ok(LogLevel::Warn),
            "e" | "error" => Ok(LogLevel::Error),
            other => Err(DevLogError::Malformed(format!("unknown level {other:?}"))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One dev log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub tag: String,
    pub level: LogLevel,
    pub message: String,
    /// Producing process.
    pub origin: String,
}

impl LogEntry {
    /// Entry stamped with the current UTC time. Text fields are sanitized for the line format.
    pub fn now(level: LogLevel, tag: &str, message: &str, origin: &str) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            tag: sanitize(tag),
            level,
            message: sanitize(message),
            origin: sanitize(origin),
        }
    }

    /// Encode as `timestamp|tag|level|origin|message` without the trailing newline.
    pub fn to_line(&self) -> String {
        let ts = self
            .timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| "<invalid-time>".to_string());
        format!(
            "{ts}{SEP}{}{SEP}{}{SEP}{}{SEP}{}",
            sanitize(&self.tag),
            self.level.letter(),
            sanitize(&self.origin),
            sanitize(&self.message),
        )
    }

    /// Decode one line written by [`LogEntry::to_line`].
    pub fn parse_line(line: &str) -> Result<Self, DevLogError> {
        let mut parts = line.splitn(5, SEP);
        let (Some(ts), Some(tag), Some(level), Some(origin), Some(message)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(DevLogError::Malformed(line.to_string()));
        };

        let timestamp = OffsetDateTime::parse(ts, &Rfc3339)
            .map_err(|e| DevLogError::Malformed(format!("{ts:?}: {e}")))?;
        Ok(Self {
            timestamp,
            tag: tag.to_string(),
            level: level.parse()?,
            message: message.to_string(),
            origin: origin.to_string(),
        })
    }

    /// Export form: `[HH:MM:SS.mmm][origin][L/tag] message`.
    pub fn to_text(&self) -> String {
        let t = self.timestamp;
        format!(
            "[{:02}:{:02}:{:02}.{:03}][{}][{}/{}] {}",
            t.hour(),
            t.minute(),
            t.second(),
            t.millisecond(),
            self.origin,
            self.level.letter(),
            self.tag,
            self.message,
        )
    }
}

/// Replace characters that would break the line format.
pub(crate) fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            SEP => '/',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

use std::fmt;

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::logger::object::{LoggerTimeZone, local_offset};

/// RFC 3339 timestamps in UTC or in the cached local offset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogTimer {
    tz: LoggerTimeZone,
}

impl LogTimer {
    pub(crate) fn new(tz: LoggerTimeZone) -> Self {
        Self { tz }
    }

    fn offset(&self) -> UtcOffset {
        match self.tz {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => local_offset(),
        }
    }

    pub(crate) fn render(&self, at: OffsetDateTime) -> String {
        at.to_offset(self.offset())
            .format(&Rfc3339)
            .unwrap_or_else(|_| "<invalid-time>".to_string())
    }
}

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} ", self.render(OffsetDateTime::now_utc()))
    }
}

use std::fmt::{self, Write as _};

use hl_devlog::{DevLog, LogLevel};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

/// Targets never copied into the dev log: the log's own diagnostics.
const SKIPPED_PREFIX: &str = "hl_devlog";

/// Layer copying tracing events into the shared dev log.
///
/// The event target becomes the tag; the message is followed by the event fields as
/// `key=value` pairs.
#[derive(Debug, Clone)]
pub struct DevLogLayer {
    devlog: DevLog,
}

impl DevLogLayer {
    pub fn new(devlog: DevLog) -> Self {
        Self { devlog }
    }
}

impl<S: Subscriber> Layer<S> for DevLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(SKIPPED_PREFIX) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.devlog
            .append(level_of(meta.level()), meta.target(), &visitor.finish());
    }
}

fn level_of(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use hl_devlog::{DIAG_TARGET, DevLogConfig};
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn devlog(dir: &TempDir) -> DevLog {
        DevLog::open(DevLogConfig {
            path: dir.path().join("dev.log"),
            max_logs: 50,
            flush_debounce_ms: 10,
            origin: Some("test".into()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn events_are_mirrored_with_fields() {
        let dir = TempDir::new().unwrap();
        let log = devlog(&dir);
        let subscriber = tracing_subscriber::registry().with(DevLogLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "hl_core::slot", content_id = 3, slot = "0", "slot reused");
            tracing::debug!(target: "hl_core::pool", "resource reused");
        });

        let entries = log.read();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, "hl_core::slot");
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].message, "slot reused content_id=3 slot=0");
        assert_eq!(entries[1].level, LogLevel::Debug);
        assert_eq!(entries[1].message, "resource reused");
    }

    #[tokio::test]
    async fn own_diagnostics_are_not_mirrored() {
        let dir = TempDir::new().unwrap();
        let log = devlog(&dir);
        let subscriber = tracing_subscriber::registry().with(DevLogLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: DIAG_TARGET, "dev log flush failed");
            tracing::info!(target: "hl_launchd", "launched");
        });

        let tags: Vec<String> = log.read().into_iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec!["hl_launchd"]);
    }

    #[test]
    fn trace_maps_to_debug() {
        assert_eq!(level_of(&Level::TRACE), LogLevel::Debug);
        assert_eq!(level_of(&Level::ERROR), LogLevel::Error);
    }
}

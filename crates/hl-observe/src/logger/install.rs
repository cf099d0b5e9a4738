use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logger::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    object::{LogTimer, LoggerFormat},
};

#[cfg(feature = "devlog")]
pub(crate) type Mirror = Option<crate::layer::DevLogLayer>;

#[cfg(not(feature = "devlog"))]
pub(crate) type Mirror = Option<tracing_subscriber::layer::Identity>;

pub(crate) fn install(cfg: &LoggerConfig, mirror: Mirror) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => text(cfg, mirror),
        LoggerFormat::Json => json(cfg, mirror),
        LoggerFormat::Journald => journald(cfg, mirror),
    }
}

fn text(cfg: &LoggerConfig, mirror: Mirror) -> LoggerResult<()> {
    let output = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(LogTimer::new(cfg.tz));

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter())
        .with(output)
        .with(mirror);
    try_init(subscriber)
}

fn json(cfg: &LoggerConfig, mirror: Mirror) -> LoggerResult<()> {
    let output = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(LogTimer::new(cfg.tz));

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter())
        .with(output)
        .with(mirror);
    try_init(subscriber)
}

#[cfg(target_os = "linux")]
fn journald(cfg: &LoggerConfig, mirror: Mirror) -> LoggerResult<()> {
    let output =
        tracing_journald::layer().map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?;

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter())
        .with(output)
        .with(mirror);
    try_init(subscriber)
}

#[cfg(not(target_os = "linux"))]
fn journald(_cfg: &LoggerConfig, _mirror: Mirror) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

fn try_init<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

mod config;
mod error;
mod install;
mod object;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, LoggerTimeZone, init_local_offset};

/// Install the global tracing subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`], call [`init_local_offset`] first, before any thread is
/// spawned.
///
/// ```no_run
/// use hl_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).expect("logger");
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    install::install(cfg, None)
}

/// Like [`init_logger`], additionally mirroring every event into `devlog` when
/// [`LoggerConfig::mirror_devlog`] is set.
#[cfg(feature = "devlog")]
pub fn init_logger_with_devlog(cfg: &LoggerConfig, devlog: hl_devlog::DevLog) -> LoggerResult<()> {
    let mirror = cfg
        .mirror_devlog
        .then(|| crate::layer::DevLogLayer::new(devlog));
    install::install(cfg, mirror)
}

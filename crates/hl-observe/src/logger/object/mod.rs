mod format;
pub use format::LoggerFormat;

mod level;
pub use level::LoggerLevel;

mod timezone;
pub use timezone::{LoggerTimeZone, init_local_offset};
pub(crate) use timezone::local_offset;

mod timer;
pub(crate) use timer::LogTimer;

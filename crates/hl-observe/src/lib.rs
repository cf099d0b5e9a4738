//! Process-wide `tracing` setup for the launcher binaries.
//!
//! One subscriber per process: an `EnvFilter`, one output layer (`text`, `json` or
//! `journald`) and, with the `devlog` feature, a layer mirroring events into the shared
//! dev log.
mod logger;
pub use logger::*;

#[cfg(feature = "devlog")]
mod layer;
#[cfg(feature = "devlog")]
pub use layer::DevLogLayer;

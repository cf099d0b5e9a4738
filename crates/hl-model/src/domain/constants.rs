//! Well-known sizing and naming constants shared by the launcher crates.

/// Number of isolated container slots the launcher rotates content through.
pub const DEFAULT_SLOT_COUNT: usize = 5;

/// Number of live rendering-engine instances kept in memory per process.
pub const DEFAULT_POOL_CAPACITY: usize = 5;

/// Host suffix of the per-content isolation origin (`https://app-{id}.<suffix>/`).
///
/// Every content is loaded under its own origin so that browser-style storage
/// (local storage, indexed db, cookies) is never shared between two contents.
pub const ISOLATION_ORIGIN_SUFFIX: &str = "hlaunch.local";

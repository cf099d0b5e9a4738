use hl_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot count must be at least 1")]
    InvalidCapacity,

    /// Persisted table could not be decoded or breaks the table invariants.
    ///
    /// Recovered inside [`crate::SlotTable`] by starting from an empty table.
    #[error("allocation table is corrupted: {0}")]
    Corrupted(String),

    #[error("slot store error: {0}")]
    Store(#[from] StoreError),
}

use hl_devlog::DevLogError;
use hl_model::ContentId;
use hl_store::StoreError;
use thiserror::Error;

use crate::{pool::PoolError, slot::SlotError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("content {0} not found")]
    NotFound(ContentId),

    #[error("content repository error: {0}")]
    Repository(String),

    #[error("container host error: {0}")]
    Host(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("dev log error: {0}")]
    DevLog(#[from] DevLogError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

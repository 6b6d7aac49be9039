use thiserror::Error;

/// Errors surfaced by the local data layer.
///
/// Remote failures are deliberately absent: the durability contract is
/// local-first, so failed remote writes are queued (or, for deletes, logged)
/// and the operation still succeeds.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

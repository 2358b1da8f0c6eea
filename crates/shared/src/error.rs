use thiserror::Error;

const FETCH_FAILED: &str = "Failed to fetch items";
const CREATE_FAILED: &str = "Failed to create item";
const UPDATE_FAILED: &str = "Failed to update item";
const DELETE_FAILED: &str = "Failed to delete item";

/// The four user-facing failures. Each renders as a fixed message; the
/// underlying cause is logged, never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SyncFailure {
    #[error("{}", FETCH_FAILED)]
    Fetch,
    #[error("{}", CREATE_FAILED)]
    Create,
    #[error("{}", UPDATE_FAILED)]
    Update,
    #[error("{}", DELETE_FAILED)]
    Delete,
}

impl SyncFailure {
    pub fn message(self) -> &'static str {
        match self {
            SyncFailure::Fetch => FETCH_FAILED,
            SyncFailure::Create => CREATE_FAILED,
            SyncFailure::Update => UPDATE_FAILED,
            SyncFailure::Delete => DELETE_FAILED,
        }
    }
}

//! Tracker errors.

use thiserror::Error;

use crate::position::PositionError;
use crate::store::StoreError;

/// Errors surfaced to the host by the tracker.
///
/// Background ticks never return these; they are logged instead.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Location access was refused; tracking cannot start.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be obtained for a manual update.
    #[error("Could not determine position: {0}")]
    Position(#[from] PositionError),

    /// A sample could not be persisted and was lost.
    #[error("Failed to queue sample: {0}")]
    Store(#[from] StoreError),
}

//! Application error types.

use std::fmt;

use crate::collector::CollectorError;
use crate::store::StoreError;
use crate::tracker::TrackerError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open the local database.
    Storage(StoreError),

    /// Failed to create the collector client.
    Collector(CollectorError),

    /// The tracker refused to start.
    Tracker(TrackerError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(e) => write!(f, "Failed to open local storage: {}", e),
            AppError::Collector(e) => write!(f, "Failed to create collector client: {}", e),
            AppError::Tracker(e) => write!(f, "Failed to start tracking: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Storage(e) => Some(e),
            AppError::Collector(e) => Some(e),
            AppError::Tracker(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Storage(e)
    }
}

impl From<CollectorError> for AppError {
    fn from(e: CollectorError) -> Self {
        AppError::Collector(e)
    }
}

impl From<TrackerError> for AppError {
    fn from(e: TrackerError) -> Self {
        AppError::Tracker(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("missing latitude".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing latitude"));
    }

    #[test]
    fn test_app_error_from_tracker_error() {
        let app_err: AppError = TrackerError::PermissionDenied.into();
        assert!(matches!(app_err, AppError::Tracker(_)));
        assert!(app_err.to_string().contains("permission denied"));
    }
}

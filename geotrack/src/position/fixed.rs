//! Fixed-position source for stationary installations.

use super::types::{PositionError, PositionSource, Sample};
use crate::geo::is_valid_coordinate;
use crate::BoxFuture;

/// Reports the same configured coordinates on every request.
#[derive(Debug, Clone, Copy)]
pub struct StaticPositionSource {
    latitude: f64,
    longitude: f64,
}

impl StaticPositionSource {
    /// Create a source for the given coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl PositionSource for StaticPositionSource {
    fn name(&self) -> &str {
        "static"
    }

    fn current_position(&self) -> BoxFuture<'_, Result<Sample, PositionError>> {
        let result = if is_valid_coordinate(self.latitude, self.longitude) {
            Ok(Sample::now(self.latitude, self.longitude))
        } else {
            Err(PositionError::Unavailable(format!(
                "configured position {}, {} is not a valid coordinate",
                self.latitude, self.longitude
            )))
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_configured_position() {
        let source = StaticPositionSource::new(19.4326, -99.1332);
        let sample = source.current_position().await.unwrap();
        assert_eq!(sample.position(), (19.4326, -99.1332));
    }

    #[tokio::test]
    async fn test_unset_position_is_unavailable() {
        let source = StaticPositionSource::new(0.0, 0.0);
        assert!(matches!(
            source.current_position().await,
            Err(PositionError::Unavailable(_))
        ));
    }
}

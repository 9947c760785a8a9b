use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::Coordinates;

/// Location acquisition failure. Permission denial carries a distinct
/// message; everything else collapses into "not available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission is required")]
    PermissionDenied,

    #[error("Location not available")]
    Unavailable,
}

/// Source of the device position. May suspend while a fix is acquired;
/// `Ok(None)` means no fix could be obtained.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn current_location(&self) -> Result<Option<Coordinates>, LocationError>;
}

/// A location source backed by a fixed coordinate pair, typically the
/// `home` entry of the config file. `None` behaves like a device with
/// no fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocationSource {
    coordinates: Option<Coordinates>,
}

impl FixedLocationSource {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current_location(&self) -> Result<Option<Coordinates>, LocationError> {
        Ok(self.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_source_returns_configured_pair() {
        let source = FixedLocationSource::new(Some(Coordinates::new(49.2265, 17.6708)));
        let fix = source.current_location().await.expect("no failure");
        assert_eq!(fix, Some(Coordinates::new(49.2265, 17.6708)));
    }

    #[tokio::test]
    async fn empty_source_has_no_fix() {
        let source = FixedLocationSource::default();
        assert_eq!(source.current_location().await, Ok(None));
    }

    #[test]
    fn permission_denied_message_is_distinct() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "Location permission is required"
        );
        assert_eq!(
            LocationError::Unavailable.to_string(),
            "Location not available"
        );
    }
}

//! Locally persisted zone set.

use tracing::info;

use super::error::GeofenceError;
use super::zone::{NewZone, Zone};
use crate::store::StateStore;

/// The device's zone list, persisted as JSON in the state store.
///
/// Duplicates (same name or same position) are allowed.
#[derive(Clone)]
pub struct GeofenceStore {
    state: StateStore,
}

impl GeofenceStore {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// All zones in insertion order.
    pub fn list(&self) -> Result<Vec<Zone>, GeofenceError> {
        Ok(self.state.zones()?)
    }

    /// Validate, assign an id and append a zone.
    pub fn add(&self, zone: NewZone) -> Result<Zone, GeofenceError> {
        let zone = zone.into_zone()?;
        let mut zones = self.list()?;
        zones.push(zone.clone());
        self.state.set_zones(&zones)?;

        info!(
            id = %zone.id,
            name = %zone.name,
            radius = zone.radius,
            "Zone added"
        );
        Ok(zone)
    }

    /// Remove a zone by id. Removing an unknown id is not an error.
    pub fn remove(&self, id: &str) -> Result<(), GeofenceError> {
        let mut zones = self.list()?;
        let before = zones.len();
        zones.retain(|z| z.id != id);
        if zones.len() != before {
            self.state.set_zones(&zones)?;
            info!(id, "Zone removed");
        }
        Ok(())
    }

    /// Replace the local set wholesale.
    pub fn reconcile(&self, zones: Vec<Zone>) -> Result<Vec<Zone>, GeofenceError> {
        self.state.set_zones(&zones)?;
        info!(count = zones.len(), "Zones replaced from collector");
        Ok(zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn store() -> GeofenceStore {
        GeofenceStore::new(StateStore::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_add_and_list() {
        let s = store();
        let zone = s.add(NewZone::new("Home", 19.4, -99.1)).unwrap();

        assert_eq!(s.list().unwrap(), vec![zone]);
    }

    #[test]
    fn test_add_invalid_is_not_persisted() {
        let s = store();
        assert!(s.add(NewZone::new("Bad", 0.0, 0.0)).is_err());
        assert!(s.list().unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_are_allowed() {
        let s = store();
        s.add(NewZone::new("Home", 19.4, -99.1)).unwrap();
        s.add(NewZone::new("Home", 19.4, -99.1)).unwrap();

        assert_eq!(s.list().unwrap().len(), 2);
    }

    #[test]
    fn test_remove() {
        let s = store();
        let a = s.add(NewZone::new("A", 19.4, -99.1)).unwrap();
        let b = s.add(NewZone::new("B", 19.5, -99.2)).unwrap();

        s.remove(&a.id).unwrap();
        s.remove("does-not-exist").unwrap();

        assert_eq!(s.list().unwrap(), vec![b]);
    }

    #[test]
    fn test_reconcile_replaces_everything() {
        let s = store();
        s.add(NewZone::new("Local", 19.4, -99.1)).unwrap();

        let server = vec![Zone {
            id: "9".into(),
            name: "Server".into(),
            latitude: 20.0,
            longitude: -100.0,
            radius: 300.0,
        }];
        let adopted = s.reconcile(server.clone()).unwrap();

        assert_eq!(adopted, server);
        assert_eq!(s.list().unwrap(), server);
    }
}

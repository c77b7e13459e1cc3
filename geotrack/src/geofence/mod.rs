//! Safe zones.
//!
//! Zones are circular areas in which the tracker throttles uploads. They are
//! created locally ("save current location as zone"), persisted in the state
//! store, and reconciled with the collector's copy on demand.
//!
//! # Reconciliation
//!
//! Reconciliation is store-and-forward, not a merge by id:
//!
//! ```text
//! local zones ──upload──► collector ──authoritative list──► replaces local
//! ```
//!
//! Two devices editing zones concurrently will clobber each other; the last
//! one to sync wins.

mod error;
mod store;
mod sync;
mod zone;

pub use error::GeofenceError;
pub use store::GeofenceStore;
pub use sync::ZoneSync;
pub use zone::{NewZone, Zone, DEFAULT_RADIUS_M};

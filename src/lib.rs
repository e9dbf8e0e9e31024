//! GDL90 codec and traffic target store
//!
//! Encoders turn typed records into framed GDL90 messages; the store merges
//! partial updates from several receivers into one record per aircraft and
//! hands out ordered snapshots for each broadcast tick.

pub mod ahrs;
pub mod broadcast;
pub mod crc;
pub mod decode;
pub mod frame;
pub mod gdl90;
pub mod icao;
pub mod quality;
pub mod report;
pub mod store;
pub mod update;

pub use frame::{frame, unframe, MalformedFrame, Unframed};
pub use icao::Icao;
pub use report::{Ownship, Traffic};
pub use store::{StoreConfig, TargetSnapshot, TrafficStore};
pub use update::{MetadataUpdate, Source, TrafficUpdate};

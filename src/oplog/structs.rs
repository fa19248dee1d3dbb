//! The structs
//!
use mongodb::bson::Timestamp;

/// The parts of `collStats` used, with `scale: 1048576`.
///
/// ```text
/// { ns: 'local.oplog.rs', size: 1843, count: 12944, avgObjSize: 149, storageSize: 612, capped: true, max: 0, maxSize: 2048, ... ok: 1 }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSize {
    pub max_size: f64,
    pub size: f64,
}

/// An oplog entry, only the timestamp is used.
///
/// ```text
/// { op: 'n', ns: '', o: { msg: 'initiating set' }, ts: Timestamp({ t: 1681196416, i: 1 }), v: Long("2"), wall: ISODate("2023-04-11T07:00:16.421Z") }
/// ```
#[derive(Debug, Deserialize)]
pub struct OplogEntry {
    pub ts: Timestamp,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OplogWindow {
    pub log_size_mb: f64,
    pub used_mb: f64,
    pub first_ts: u32,
    pub last_ts: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OplogCollector;

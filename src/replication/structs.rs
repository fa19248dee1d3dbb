//! The structs
//!
use mongodb::bson::DateTime;

/// The replica set member state, as reported in `myState` and `members.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MemberState(pub i32);

/// The three way role indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Other,
}

/// The parts of `replSetGetStatus` that are used.
///
/// ```text
/// {
///   set: 'rs0',
///   date: ISODate("2023-04-14T09:12:25.113Z"),
///   myState: 1,
///   members: [
///     {
///       _id: 0,
///       name: 'mongo-1:27017',
///       health: 1,
///       state: 1,
///       stateStr: 'PRIMARY',
///       optimeDate: ISODate("2023-04-14T09:12:20.000Z"),
///       electionDate: ISODate("2023-04-10T06:40:02.000Z"),
///       self: true,
///       ...
///     },
///     {
///       _id: 1,
///       name: 'mongo-2:27017',
///       state: 2,
///       stateStr: 'SECONDARY',
///       optimeDate: ISODate("2023-04-14T09:12:20.000Z"),
///       lastHeartbeatRecv: ISODate("2023-04-14T09:12:24.561Z"),
///       ...
///     }
///   ],
///   ok: 1
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplSetStatus {
    pub set: Option<String>,
    pub date: DateTime,
    pub my_state: MemberState,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub name: String,
    pub state: MemberState,
    #[serde(rename = "self", default)]
    pub is_self: bool,
    pub optime_date: Option<DateTime>,
    pub election_date: Option<DateTime>,
    pub last_heartbeat_recv: Option<DateTime>,
}

/// `replSetGetConfig` returns the config in the `config` field.
#[derive(Debug, Deserialize)]
pub struct ReplSetConfigResponse {
    pub config: ReplSetConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplSetConfig {
    #[serde(rename = "_id")]
    pub id: String,
    pub version: i64,
    #[serde(default)]
    pub term: i64,
    #[serde(default)]
    pub protocol_version: i64,
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

/// A member in the replica set config. `host` matches `name` in the status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberConfig {
    pub host: String,
    #[serde(default)]
    pub arbiter_only: bool,
    #[serde(default)]
    pub build_indexes: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub priority: f64,
    #[serde(default)]
    pub votes: f64,
}

/// The facts derived from the status and the config for the member the exporter is connected to.
/// Times are in seconds.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplicationSnapshot {
    pub heartbeat_delay: i64,
    pub lag: i64,
    pub odd_state: i32,
    pub elected_before_secs: i64,
    pub status: i32,
    pub version: i64,
    pub term: i64,
    pub protocol_version: i64,
    pub arbiter_only: bool,
    pub build_indexes: bool,
    pub hidden: bool,
    pub priority: f64,
    pub votes: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReplicationCollector {
    pub is_mongos: bool,
}

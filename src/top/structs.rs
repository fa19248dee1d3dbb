//! The structs
//!
use std::collections::BTreeMap;
use mongodb::bson::Document;

/// The `top` response. `totals` holds a document per namespace and a `note` string.
///
/// ```text
/// {
///   totals: {
///     note: 'all times in microseconds',
///     'shop.orders': {
///       total: { time: 4310, count: 37 },
///       readLock: { time: 1203, count: 21 },
///       writeLock: { time: 3107, count: 16 },
///       queries: { time: 1100, count: 20 },
///       getmore: { time: 0, count: 0 },
///       insert: { time: 2900, count: 15 },
///       update: { time: 207, count: 1 },
///       remove: { time: 0, count: 0 },
///       commands: { time: 103, count: 1 }
///     }
///   },
///   ok: 1
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct TopResponse {
    pub totals: Document,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TopField {
    pub time: i64,
    pub count: i64,
}

/// The usage of a namespace. An operation that is not reported counts as 0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamespaceUsage {
    pub insert: TopField,
    pub queries: TopField,
    pub update: TopField,
    pub remove: TopField,
    pub getmore: TopField,
    pub commands: TopField,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TopUsage {
    pub namespaces: BTreeMap<String, NamespaceUsage>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TopCollector;

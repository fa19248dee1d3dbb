//! Module for the snapshot cache.
//!
//! Every metric source is wrapped in a [SnapshotCache]. A scrape first primes the cache,
//! which runs the collector once and captures everything it emits, and then replays the captured
//! metrics as often as needed without running the collector again.
//!
//! Priming:
//! - takes the cache lock and empties the buffer.
//! - spawns the collector as a tokio task that sends metrics over a channel ([MetricSink]).
//! - drains the channel into the buffer until the collector is done, handing every descriptor to the caller.
//!
//! A collector that fails halfway (a failing command, even a panic) leaves whatever it emitted until then.
//! That is not an error: a source without metrics simply has nothing to replay.
//!
mod structs;
mod functions;

pub use structs::*;

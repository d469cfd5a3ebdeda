//! Sync layer: background connectivity probing and remote ruleset pulls
//! with bounded retry.

pub mod probe;
pub mod ruleset;

pub use probe::{ConnectivityMonitor, MonitorHandle};
pub use ruleset::{RetryPolicy, RulesetClient, SyncError};

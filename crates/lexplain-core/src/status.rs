//! Process-wide connectivity state.
//!
//! A single explicitly-owned status object, written only by the prober task
//! in `lexplain-sync` and read by everything else through a
//! `tokio::sync::watch` channel. Never an ambient global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection quality bucketed from the fraction of reachable probe
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Offline,
}

impl ConnectionQuality {
    /// Bucket a reachable/total endpoint count.
    ///
    /// All reachable → excellent, >70% → good, >30% → fair, any → poor,
    /// none (or no endpoints) → offline.
    pub fn from_counts(reachable: usize, total: usize) -> Self {
        if total == 0 || reachable == 0 {
            return Self::Offline;
        }
        let fraction = reachable as f64 / total as f64;
        if reachable == total {
            Self::Excellent
        } else if fraction > 0.7 {
            Self::Good
        } else if fraction > 0.3 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reachability of one probe endpoint at the last check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub url: String,
    pub reachable: bool,
}

/// Snapshot of connectivity as of the last probe cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityStatus {
    pub is_online: bool,
    pub quality: ConnectionQuality,
    pub last_checked: DateTime<Utc>,
    /// Set while offline: when connectivity was last lost.
    pub offline_since: Option<DateTime<Utc>>,
    pub endpoints: Vec<EndpointStatus>,
}

impl ConnectivityStatus {
    /// Initial state before the first probe completes.
    ///
    /// Assumed online so early calls attempt live computation; the first
    /// probe cycle corrects this if the assumption was wrong.
    pub fn assumed_online() -> Self {
        Self {
            is_online: true,
            quality: ConnectionQuality::Good,
            last_checked: Utc::now(),
            offline_since: None,
            endpoints: Vec::new(),
        }
    }

    /// Build a snapshot from per-endpoint probe results, carrying
    /// `offline_since` forward from the previous snapshot.
    pub fn from_probe(endpoints: Vec<EndpointStatus>, previous: Option<&Self>) -> Self {
        let reachable = endpoints.iter().filter(|e| e.reachable).count();
        let quality = ConnectionQuality::from_counts(reachable, endpoints.len());
        let is_online = quality != ConnectionQuality::Offline;
        let now = Utc::now();

        let offline_since = if is_online {
            None
        } else {
            previous
                .and_then(|p| p.offline_since)
                .or(Some(now))
        };

        Self {
            is_online,
            quality,
            last_checked: now,
            offline_since,
            endpoints,
        }
    }
}

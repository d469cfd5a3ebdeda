//! Background connectivity prober.
//!
//! Probes each configured endpoint on a fixed cycle, buckets the result
//! into a connection quality, and publishes [`ConnectivityStatus`]
//! snapshots over a watch channel. The prober is the only writer of
//! connectivity state; every other component holds a receiver and reads.

use lexplain_core::{ConnectivityStatus, EndpointStatus, ProbeConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ruleset::SyncError;

/// Probes endpoints and reports connectivity.
pub struct ConnectivityMonitor {
    config: ProbeConfig,
    client: reqwest::Client,
}

impl ConnectivityMonitor {
    pub fn new(config: ProbeConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }

    /// Run one probe cycle against every configured endpoint concurrently.
    pub async fn check(&self, previous: Option<&ConnectivityStatus>) -> ConnectivityStatus {
        let probes = self.config.endpoints.iter().map(|url| async {
            EndpointStatus {
                url: url.clone(),
                reachable: self.probe_endpoint(url).await,
            }
        });
        let endpoints = futures::future::join_all(probes).await;
        ConnectivityStatus::from_probe(endpoints, previous)
    }

    async fn probe_endpoint(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                status.is_success() || status.is_redirection()
            }
            Err(_) => false,
        }
    }

    /// Start the periodic probe loop.
    ///
    /// The task suspends between cycles and stops cleanly when the returned
    /// handle is shut down or when every status receiver is dropped.
    pub fn spawn(self) -> MonitorHandle {
        let (status_tx, status_rx) = watch::channel(ConnectivityStatus::assumed_online());
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = self.config.interval();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(
                endpoints = self.config.endpoints.len(),
                interval_secs = self.config.interval_secs,
                "connectivity monitoring started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let previous = status_tx.borrow().clone();
                        let status = self.check(Some(&previous)).await;
                        debug!(
                            online = status.is_online,
                            quality = %status.quality,
                            "probe cycle complete"
                        );
                        if status_tx.send(status).is_err() {
                            break;
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("connectivity monitoring stopped");
                            break;
                        }
                    }
                }
            }
        });

        MonitorHandle {
            status_rx,
            shutdown_tx,
            task,
        }
    }
}

/// Handle to a running prober: status receivers plus cancellation.
pub struct MonitorHandle {
    status_rx: watch::Receiver<ConnectivityStatus>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// A receiver for status snapshots; clone freely.
    pub fn status(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status_rx.clone()
    }

    /// Stop the probe loop and wait for it to wind down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexplain_core::ConnectionQuality;
    use std::time::Duration;

    /// Probe config pointed at a port nothing listens on, so every probe
    /// fails fast without leaving the machine.
    fn unreachable_config(endpoints: usize) -> ProbeConfig {
        ProbeConfig {
            interval_secs: 1,
            timeout_secs: 1,
            endpoints: (0..endpoints)
                .map(|i| format!("http://127.0.0.1:9/probe-{i}"))
                .collect(),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoints_read_as_offline() {
        let monitor = ConnectivityMonitor::new(unreachable_config(2)).unwrap();
        let status = monitor.check(None).await;

        assert!(!status.is_online);
        assert_eq!(status.quality, ConnectionQuality::Offline);
        assert_eq!(status.endpoints.len(), 2);
        assert!(status.endpoints.iter().all(|e| !e.reachable));
        assert!(status.offline_since.is_some());
    }

    #[tokio::test]
    async fn no_endpoints_reads_as_offline() {
        let monitor = ConnectivityMonitor::new(unreachable_config(0)).unwrap();
        let status = monitor.check(None).await;
        assert!(!status.is_online);
    }

    #[tokio::test]
    async fn spawned_monitor_publishes_and_shuts_down() {
        let monitor = ConnectivityMonitor::new(unreachable_config(1)).unwrap();
        let handle = monitor.spawn();
        let mut rx = handle.status();

        // The initial snapshot assumes online; the first probe corrects it.
        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_online);

        // Cancellation must complete promptly.
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown should not hang");
    }
}

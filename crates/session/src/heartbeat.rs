//! Heartbeat monitor
//!
//! Tracks when each application was last heard from. Every tick, silent
//! applications past the threshold are evicted (record removed, routing
//! purged, listener told once), and the rest get a keep-alive reply on
//! their Admin destination.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use hermes_core::{ApplicationId, HeartbeatResponse, MessageType, Timestamp};
use hermes_ports::Clock;
use log::{debug, info, warn};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::directory::RoutingDirectory;
use crate::error::{Result, SessionError};

/// Process-wide heartbeat settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Silence longer than this evicts an application
    pub threshold: Duration,
    /// Time between ticks
    pub interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_millis(5_000),
            interval: Duration::from_millis(1_000),
        }
    }
}

impl HeartbeatConfig {
    pub fn from_millis(threshold_ms: u64, interval_ms: u64) -> Self {
        Self {
            threshold: Duration::from_millis(threshold_ms),
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(SessionError::InvalidHeartbeatConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.threshold < self.interval {
            return Err(SessionError::InvalidHeartbeatConfig(format!(
                "threshold {:?} is shorter than interval {:?}",
                self.threshold, self.interval
            )));
        }
        Ok(())
    }
}

/// Receives the monitor's outputs
pub trait HeartbeatListener: Send + Sync {
    /// Deliver a keep-alive reply to an active application
    fn on_heartbeat_response(
        &self,
        destination: &str,
        response: HeartbeatResponse,
    ) -> Result<()>;

    /// An application went silent and was evicted
    fn on_application_disconnect(&self, app_id: &ApplicationId);
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub responded: usize,
    pub evicted: Vec<ApplicationId>,
    pub failed: usize,
}

pub struct HeartbeatMonitor {
    config: HeartbeatConfig,
    threshold: chrono::Duration,
    records: DashMap<ApplicationId, Timestamp>,
    directory: Arc<RoutingDirectory>,
    clock: Arc<dyn Clock>,
    listener: RwLock<Option<Arc<dyn HeartbeatListener>>>,
}

impl HeartbeatMonitor {
    pub fn new(
        config: HeartbeatConfig,
        directory: Arc<RoutingDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let threshold = chrono::Duration::from_std(config.threshold)
            .map_err(|e| SessionError::InvalidHeartbeatConfig(e.to_string()))?;

        Ok(Self {
            config,
            threshold,
            records: DashMap::new(),
            directory,
            clock,
            listener: RwLock::new(None),
        })
    }

    /// Attach the single listener
    pub fn set_listener(&self, listener: Arc<dyn HeartbeatListener>) -> Result<()> {
        let mut slot = self.listener.write();
        if slot.is_some() {
            return Err(SessionError::ListenerAlreadyAttached);
        }
        *slot = Some(listener);
        Ok(())
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    /// Record that `app_id` was alive at `timestamp`
    ///
    /// Creates the record if unseen. A timestamp older than the stored one
    /// is ignored. Returns true when the record changed.
    pub fn update(&self, app_id: &ApplicationId, timestamp: Timestamp) -> bool {
        let mut changed = true;
        self.records
            .entry(app_id.clone())
            .and_modify(|last| {
                if timestamp > *last {
                    *last = timestamp;
                } else {
                    changed = false;
                }
            })
            .or_insert(timestamp);
        changed
    }

    /// Stop tracking without raising a disconnect
    pub fn remove(&self, app_id: &ApplicationId) -> bool {
        self.records.remove(app_id).is_some()
    }

    pub fn last_seen(&self, app_id: &ApplicationId) -> Option<Timestamp> {
        self.records.get(app_id).map(|last| *last)
    }

    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Evict silent applications and answer the rest
    ///
    /// A failure for one application is logged and the tick moves on.
    pub fn tick(&self, now: Timestamp) -> TickOutcome {
        let listener = self.listener.read().clone();
        let snapshot: Vec<(ApplicationId, Timestamp)> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let mut outcome = TickOutcome::default();
        for (app_id, last_seen) in snapshot {
            if now - last_seen > self.threshold {
                // Re-check under the shard lock in case an update raced us
                let evicted = self
                    .records
                    .remove_if(&app_id, |_, last| now - *last > self.threshold)
                    .is_some();
                if evicted {
                    self.evict(&app_id, now - last_seen, listener.as_deref());
                    outcome.evicted.push(app_id);
                }
                continue;
            }

            match self.respond(&app_id, now, listener.as_deref()) {
                Ok(()) => outcome.responded += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!("Heartbeat reply to {} failed: {}", app_id, e);
                }
            }
        }
        outcome
    }

    /// Run `tick` every `interval` on the tokio runtime
    ///
    /// The first tick comes one full interval after start.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                "Starting heartbeat monitor: interval {:?}, threshold {:?}",
                monitor.config.interval, monitor.config.threshold
            );
            let period = monitor.config.interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let outcome = monitor.tick(monitor.clock.now());
                if !outcome.evicted.is_empty() || outcome.failed > 0 {
                    debug!(
                        "Heartbeat tick: {} replied, {} evicted, {} failed",
                        outcome.responded,
                        outcome.evicted.len(),
                        outcome.failed
                    );
                }
            }
        })
    }

    fn evict(
        &self,
        app_id: &ApplicationId,
        silence: chrono::Duration,
        listener: Option<&dyn HeartbeatListener>,
    ) {
        self.directory.unregister(app_id);
        info!(
            "Evicting application {} after {}ms without heartbeat",
            app_id,
            silence.num_milliseconds()
        );
        if let Some(listener) = listener {
            listener.on_application_disconnect(app_id);
        }
    }

    fn respond(
        &self,
        app_id: &ApplicationId,
        now: Timestamp,
        listener: Option<&dyn HeartbeatListener>,
    ) -> Result<()> {
        let destination = self
            .directory
            .resolve(app_id, MessageType::Admin)
            .ok_or_else(|| SessionError::NoDestination {
                app_id: app_id.clone(),
                message_type: MessageType::Admin,
            })?;

        if let Some(listener) = listener {
            let response = HeartbeatResponse {
                app_id: app_id.clone(),
                timestamp: now,
            };
            listener.on_heartbeat_response(&destination, response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hermes_clock::ManualClock;
    use hermes_core::AppInfo;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        responses: Mutex<Vec<(String, HeartbeatResponse)>>,
        disconnects: Mutex<Vec<ApplicationId>>,
        fail_for: Option<String>,
    }

    impl HeartbeatListener for RecordingListener {
        fn on_heartbeat_response(
            &self,
            destination: &str,
            response: HeartbeatResponse,
        ) -> Result<()> {
            if self.fail_for.as_deref() == Some(response.app_id.as_str()) {
                return Err(SessionError::Publish("broker down".to_string()));
            }
            self.responses
                .lock()
                .push((destination.to_string(), response));
            Ok(())
        }

        fn on_application_disconnect(&self, app_id: &ApplicationId) {
            self.disconnects.lock().push(app_id.clone());
        }
    }

    fn setup(
        listener: RecordingListener,
    ) -> (HeartbeatMonitor, Arc<RoutingDirectory>, Arc<RecordingListener>) {
        let directory = Arc::new(RoutingDirectory::new());
        let monitor = HeartbeatMonitor::new(
            HeartbeatConfig::from_millis(5_000, 1_000),
            directory.clone(),
            ManualClock::starting_now(),
        )
        .unwrap();
        let listener = Arc::new(listener);
        monitor.set_listener(listener.clone()).unwrap();
        (monitor, directory, listener)
    }

    fn register(directory: &RoutingDirectory, id: &str) -> ApplicationId {
        let info = AppInfo::new(id).with_destination(MessageType::Admin, format!("{}.admin", id));
        directory.register_app_info(&info).unwrap();
        ApplicationId::from(id)
    }

    #[test]
    fn test_config_validation() {
        assert!(HeartbeatConfig::default().validate().is_ok());
        assert!(HeartbeatConfig::from_millis(5_000, 0).validate().is_err());
        assert!(HeartbeatConfig::from_millis(500, 1_000).validate().is_err());
    }

    #[test]
    fn test_silent_application_evicted_exactly_once() {
        let (monitor, directory, listener) = setup(RecordingListener::default());
        let app = register(&directory, "X123");
        let t0 = Utc::now();
        monitor.update(&app, t0);

        let outcome = monitor.tick(t0 + chrono::Duration::milliseconds(6_000));
        assert_eq!(outcome.evicted, vec![app.clone()]);

        let outcome = monitor.tick(t0 + chrono::Duration::milliseconds(7_000));
        assert!(outcome.evicted.is_empty());

        assert_eq!(*listener.disconnects.lock(), vec![app.clone()]);
        assert_eq!(directory.resolve(&app, MessageType::Admin), None);
        assert_eq!(monitor.tracked(), 0);
    }

    #[test]
    fn test_regular_heartbeats_keep_application_alive() {
        let (monitor, directory, listener) = setup(RecordingListener::default());
        let app = register(&directory, "X123");
        let t0 = Utc::now();

        for step in 0..10 {
            let t = t0 + chrono::Duration::milliseconds(step * 4_000);
            monitor.update(&app, t);
            let outcome = monitor.tick(t + chrono::Duration::milliseconds(4_900));
            assert!(outcome.evicted.is_empty());
        }

        assert!(listener.disconnects.lock().is_empty());
        assert_eq!(listener.responses.lock().len(), 10);
        assert_eq!(listener.responses.lock()[0].0, "X123.admin");
    }

    #[test]
    fn test_exactly_at_threshold_is_still_alive() {
        let (monitor, directory, _listener) = setup(RecordingListener::default());
        let app = register(&directory, "X123");
        let t0 = Utc::now();
        monitor.update(&app, t0);

        let outcome = monitor.tick(t0 + chrono::Duration::milliseconds(5_000));

        assert!(outcome.evicted.is_empty());
        assert_eq!(outcome.responded, 1);
    }

    #[test]
    fn test_older_timestamp_is_ignored() {
        let (monitor, _directory, _listener) = setup(RecordingListener::default());
        let app = ApplicationId::from("X123");
        let t0 = Utc::now();

        assert!(monitor.update(&app, t0));
        assert!(!monitor.update(&app, t0 - chrono::Duration::seconds(1)));
        assert!(!monitor.update(&app, t0));
        assert_eq!(monitor.last_seen(&app), Some(t0));
    }

    #[test]
    fn test_one_failure_does_not_stop_tick() {
        let (monitor, directory, listener) = setup(RecordingListener {
            fail_for: Some("bad".to_string()),
            ..Default::default()
        });
        let t0 = Utc::now();
        for id in ["a", "bad", "c"] {
            let app = register(&directory, id);
            monitor.update(&app, t0);
        }
        // Tracked but never sent AppInfo: no Admin destination
        monitor.update(&ApplicationId::from("anonymous"), t0);

        let outcome = monitor.tick(t0 + chrono::Duration::milliseconds(1_000));

        assert_eq!(outcome.responded, 2);
        assert_eq!(outcome.failed, 2);
        let mut destinations: Vec<String> = listener
            .responses
            .lock()
            .iter()
            .map(|(d, _)| d.clone())
            .collect();
        destinations.sort();
        assert_eq!(destinations, vec!["a.admin", "c.admin"]);
    }

    #[test]
    fn test_second_listener_rejected() {
        let (monitor, _directory, _listener) = setup(RecordingListener::default());

        assert_eq!(
            monitor.set_listener(Arc::new(RecordingListener::default())),
            Err(SessionError::ListenerAlreadyAttached)
        );
    }

    #[test]
    fn test_remove_skips_notification() {
        let (monitor, directory, listener) = setup(RecordingListener::default());
        let app = register(&directory, "X123");
        let t0 = Utc::now();
        monitor.update(&app, t0);

        assert!(monitor.remove(&app));
        monitor.tick(t0 + chrono::Duration::milliseconds(10_000));

        assert!(listener.disconnects.lock().is_empty());
    }
}

//! Routing directory
//!
//! Application id → reply routing key per message class. An application is
//! present from its `AppInfo` handshake until it disconnects or is evicted.

use std::collections::HashMap;

use dashmap::DashMap;
use hermes_core::{AppInfo, ApplicationId, MessageType};
use log::debug;

use crate::error::{Result, SessionError};

#[derive(Default)]
pub struct RoutingDirectory {
    sessions: DashMap<ApplicationId, HashMap<MessageType, String>>,
}

impl RoutingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the destinations for an application
    ///
    /// Empty routing keys are treated as undeclared. Returns true when the
    /// application was not registered before.
    pub fn register(
        &self,
        app_id: &ApplicationId,
        destinations: HashMap<MessageType, String>,
    ) -> Result<bool> {
        if app_id.is_empty() {
            return Err(SessionError::EmptyApplicationId);
        }

        let destinations: HashMap<_, _> = destinations
            .into_iter()
            .filter(|(_, routing_key)| !routing_key.is_empty())
            .collect();
        let declared = destinations.len();
        let is_new = self.sessions.insert(app_id.clone(), destinations).is_none();

        debug!(
            "{} application {} with {} destinations",
            if is_new { "Registered" } else { "Re-registered" },
            app_id,
            declared
        );
        Ok(is_new)
    }

    /// Register from an `AppInfo` handshake
    pub fn register_app_info(&self, info: &AppInfo) -> Result<bool> {
        self.register(&info.app_id, info.destinations.clone())
    }

    /// Routing key for `message_type`, if the application declared one
    pub fn resolve(&self, app_id: &ApplicationId, message_type: MessageType) -> Option<String> {
        self.sessions
            .get(app_id)
            .and_then(|destinations| destinations.get(&message_type).cloned())
    }

    /// Remove all routing state; returns true if the application was known
    pub fn unregister(&self, app_id: &ApplicationId) -> bool {
        self.sessions.remove(app_id).is_some()
    }

    pub fn contains(&self, app_id: &ApplicationId) -> bool {
        self.sessions.contains_key(app_id)
    }

    pub fn applications(&self) -> Vec<ApplicationId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use hermes_core::ApplicationId;
use uuid::Uuid;

/// Hands out application ids of the form `{prefix}-{counter}`
///
/// The counter makes ids unique and increasing within one server; the
/// random default prefix keeps them apart across restarts.
pub struct AppIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl Default for AppIdGenerator {
    fn default() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self::with_prefix(&uuid[..8])
    }
}

impl AppIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> ApplicationId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        ApplicationId::new(format!("{}-{:06}", self.prefix, n))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of ids issued so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

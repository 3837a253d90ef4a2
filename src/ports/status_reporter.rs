//! StatusReporter port - how an adapter publishes its own [`AdapterState`].
//!
//! [`AdapterState`]: crate::domain::adapter::AdapterState

use crate::domain::adapter::{AdapterSession, AdapterStatus};

/// Write handle for exactly one adapter's state entry.
pub trait StatusReporter: Send + Sync {
    /// Requests a status change; invalid transitions are ignored.
    fn set_status(&self, status: AdapterStatus);

    /// Replaces the adapter-specific session data.
    fn set_session(&self, session: AdapterSession);

    /// Records the most recent failure.
    fn record_error(&self, error: &str);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatusReporter;

impl StatusReporter for NoopStatusReporter {
    fn set_status(&self, _status: AdapterStatus) {}
    fn set_session(&self, _session: AdapterSession) {}
    fn record_error(&self, _error: &str) {}
}

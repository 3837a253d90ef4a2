//! StatusBoard - registry of adapter states.
//!
//! Each adapter gets exactly one [`AdapterReporter`] when it is registered.
//! Only that reporter mutates the adapter's entry; everything else reads
//! snapshots.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::domain::adapter::{AdapterSession, AdapterState, AdapterStatus};
use crate::domain::foundation::AdapterId;
use crate::ports::StatusReporter;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusBoardError {
    #[error("adapter {0} is already registered")]
    AlreadyRegistered(AdapterId),
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    entries: RwLock<BTreeMap<AdapterId, AdapterState>>,
}

impl StatusBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates the entry for `adapter` and hands out its only reporter.
    pub fn register(
        self: &Arc<Self>,
        adapter: AdapterId,
    ) -> Result<Arc<AdapterReporter>, StatusBoardError> {
        let mut entries = self.write();
        if entries.contains_key(&adapter) {
            return Err(StatusBoardError::AlreadyRegistered(adapter));
        }
        entries.insert(adapter.clone(), AdapterState::new(adapter.clone()));

        Ok(Arc::new(AdapterReporter {
            board: Arc::clone(self),
            adapter,
        }))
    }

    pub fn get(&self, adapter: &AdapterId) -> Option<AdapterState> {
        self.read().get(adapter).cloned()
    }

    /// Every adapter's state, ordered by adapter id.
    pub fn snapshot(&self) -> Vec<AdapterState> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update(&self, adapter: &AdapterId, apply: impl FnOnce(&mut AdapterState)) {
        if let Some(state) = self.write().get_mut(adapter) {
            apply(state);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<AdapterId, AdapterState>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<AdapterId, AdapterState>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write handle for one adapter's entry.
#[derive(Debug)]
pub struct AdapterReporter {
    board: Arc<StatusBoard>,
    adapter: AdapterId,
}

impl AdapterReporter {
    pub fn adapter(&self) -> &AdapterId {
        &self.adapter
    }

    /// Current status of this reporter's entry.
    pub fn status(&self) -> Option<AdapterStatus> {
        self.board.get(&self.adapter).map(|state| state.status())
    }
}

impl StatusReporter for AdapterReporter {
    fn set_status(&self, status: AdapterStatus) {
        self.board.update(&self.adapter, |state| {
            let from = state.status();
            match state.transition(status) {
                Ok(()) if from != status => {
                    tracing::debug!(adapter = %self.adapter, from = ?from, to = ?status, "Adapter status changed");
                }
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(adapter = %self.adapter, "Ignoring status change: {}", e);
                }
            }
        });
    }

    fn set_session(&self, session: AdapterSession) {
        self.board.update(&self.adapter, |state| state.set_session(session));
    }

    fn record_error(&self, error: &str) {
        self.board.update(&self.adapter, |state| state.record_error(error));
    }
}

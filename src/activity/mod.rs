//! Activity feed for vault lifecycle events.
//!
//! Create, update and delete emit a fire-and-forget event.  A failing
//! sink is logged and otherwise ignored: it never fails the vault
//! operation that produced the event.

use std::fmt;
use std::sync::Mutex;

use tracing::info;

use crate::errors::{Result, VaultError};

/// Lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Created,
    Updated,
    Deleted,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `vault_item created/updated/deleted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub community_id: String,
    pub item_id: String,
    pub title: String,
    pub actor_id: String,
}

/// Receiver of activity events (audit feed, admin notifications, ...).
pub trait ActivitySink {
    fn publish(&self, event: &ActivityEvent) -> Result<()>;
}

/// Default sink: writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivitySink;

impl ActivitySink for TracingActivitySink {
    fn publish(&self, event: &ActivityEvent) -> Result<()> {
        info!(
            kind = %event.kind,
            community_id = %event.community_id,
            item_id = %event.item_id,
            actor_id = %event.actor_id,
            "vault_item {}",
            event.kind
        );
        Ok(())
    }
}

/// Sink that keeps events in memory, for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingActivitySink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingActivitySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far.
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ActivitySink for RecordingActivitySink {
    fn publish(&self, event: &ActivityEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|e| VaultError::CommandFailed(format!("activity sink poisoned: {e}")))?
            .push(event.clone());
        Ok(())
    }
}

impl<T: ActivitySink + ?Sized> ActivitySink for std::sync::Arc<T> {
    fn publish(&self, event: &ActivityEvent) -> Result<()> {
        (**self).publish(event)
    }
}

//! Domain event system: decoupled communication between components.
//!
//! Events are published when something interesting happens (a zone index is
//! built, the selector picks tools, a chat turn completes). Other components
//! can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A zone's index pair and summary are ready
    ZoneIndexed {
        zone_id: String,
        /// "hit", "miss" or "stale" for vector index, summary index, summary
        cache: [String; 3],
        chunks: usize,
        timestamp: DateTime<Utc>,
    },

    /// A zone failed to build and was marked unavailable
    ZoneFailed {
        zone_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The selector resolved tools for a query
    ToolsSelected {
        query_preview: String,
        candidates: usize,
        selected: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The dispatch agent produced a final answer
    ResponseGenerated {
        session_id: String,
        iterations: u32,
        tools_used: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

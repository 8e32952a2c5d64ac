//! The bounded audit log.
//!
//! Every state-affecting event is appended here. When the log is full the
//! oldest entries are dropped first, so the log always holds the most
//! recent `capacity` events in append order.

use std::collections::VecDeque;

use chrono::Utc;
use serde_json::Value;
use worldtick_types::{AgentId, EventKind, LogEvent};

/// Default number of events retained.
pub const MAX_LOGS: usize = 5000;

/// Append-only ring of [`LogEvent`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLog {
    events: VecDeque<LogEvent>,
    capacity: usize,
}

impl AuditLog {
    /// Create an empty log holding at most `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an event stamped with the current wall-clock time.
    pub fn record(&mut self, tick: u64, event: EventKind, data: Value) {
        self.push(LogEvent::new(Utc::now(), tick, event, data));
    }

    /// Append an existing event, dropping the oldest when full.
    pub fn push(&mut self, event: LogEvent) {
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The last `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEvent> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).cloned().collect()
    }

    /// The last `limit` events whose data names `agent_id`, oldest first.
    pub fn for_agent(&self, agent_id: AgentId, limit: usize) -> Vec<LogEvent> {
        let mut matched: Vec<LogEvent> = self
            .events
            .iter()
            .rev()
            .filter(|e| e.agent_id() == Some(agent_id))
            .take(limit)
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    /// Iterate over all retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of retained events.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(MAX_LOGS)
    }
}

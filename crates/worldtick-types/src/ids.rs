//! Type-safe identifier wrapper for agents.
//!
//! Agent ids are small positive integers assigned as `max(existing) + 1`
//! when an agent joins, so snapshots with gaps in the id sequence stay
//! consistent after a reload. Zero is never assigned and is used as the
//! "no such agent" sentinel for malformed persisted payloads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for an agent in the world.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(pub u64);

impl AgentId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Whether this id could have been assigned by a join (non-zero).
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// The id following this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<AgentId> for u64 {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_valid_agent_id() {
        assert!(!AgentId(0).is_valid());
        assert!(AgentId(1).is_valid());
    }

    #[test]
    fn next_id_checks_overflow() {
        assert_eq!(AgentId(4).next(), Some(AgentId(5)));
        assert_eq!(AgentId(u64::MAX).next(), None);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&AgentId(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
    }
}

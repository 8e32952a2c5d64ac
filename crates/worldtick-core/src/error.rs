//! Error type for world store operations.

use worldtick_agents::AgentError;

use crate::entry::EntryError;
use crate::snapshot::SnapshotError;

/// Errors returned by [`WorldStore`](crate::store::WorldStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A request about agents or actions was refused.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Paid entry failed.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Saving or loading a snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The tick step count is outside the accepted range.
    #[error("steps must be between 1 and {max}, got {steps}")]
    InvalidSteps {
        /// Requested step count.
        steps: u32,
        /// Largest accepted step count.
        max: u32,
    },

    /// The autonomy agent limit is outside the accepted range.
    #[error("limit_agents must be between 1 and {max}, got {limit}")]
    InvalidLimit {
        /// Requested limit.
        limit: usize,
        /// Largest accepted limit.
        max: usize,
    },

    /// No scenario has this name.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// The tick counter cannot advance further.
    #[error("tick counter overflow at tick {tick}")]
    TickOverflow {
        /// The tick that could not be advanced.
        tick: u64,
    },
}

impl CoreError {
    /// Whether the caller's request was refused, as opposed to the system
    /// failing to carry it out.
    pub const fn is_domain_rejection(&self) -> bool {
        match self {
            Self::Agent(_)
            | Self::InvalidSteps { .. }
            | Self::InvalidLimit { .. }
            | Self::UnknownScenario(_) => true,
            Self::Entry(err) => err.is_rejection(),
            Self::Snapshot(_) | Self::TickOverflow { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use worldtick_types::AgentId;

    use super::*;

    #[test]
    fn agent_errors_are_domain_rejections() {
        let err = CoreError::from(AgentError::AgentNotFound(AgentId(4)));
        assert!(err.is_domain_rejection());
        assert_eq!(err.to_string(), "agent not found: 4");
    }

    #[test]
    fn system_failures_are_not() {
        assert!(!CoreError::TickOverflow { tick: u64::MAX }.is_domain_rejection());
        assert!(!CoreError::from(SnapshotError::UnsupportedSchema("2".to_owned())).is_domain_rejection());
    }
}

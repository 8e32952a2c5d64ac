//! Error types for the worldtick-agents crate.
//!
//! These are domain rejections: recoverable, caused by what a caller asked
//! for rather than by a broken system. Queue-time validation returns them to
//! the caller; apply-time handlers attach them to denial outcomes.

use worldtick_ledger::LedgerError;
use worldtick_types::{ActionType, AgentId};

/// Errors that can occur during agent and action operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// No agent with the given id exists.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The action payload failed structural validation.
    #[error("invalid {action} payload: {reason}")]
    InvalidPayload {
        /// The action type being validated.
        action: ActionType,
        /// What is wrong with the payload.
        reason: String,
    },

    /// The action type tag is not one of the known types.
    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    /// The requested agent name is not acceptable.
    #[error("invalid agent name: {reason}")]
    InvalidName {
        /// What is wrong with the name.
        reason: String,
    },

    /// The agent cannot pay for the action.
    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount required.
        needed: u64,
        /// Balance held.
        available: u64,
    },

    /// The workshop has no capacity left this tick.
    #[error("workshop capacity exceeded")]
    CapacityExceeded,

    /// A transfer names a receiver that does not exist.
    #[error("unknown transfer target: agent {0}")]
    UnknownTarget(AgentId),

    /// No further agent id can be assigned.
    #[error("agent id space exhausted")]
    IdExhausted,
}

impl AgentError {
    /// Map an economy rule failure onto the domain rejection it represents
    /// for an action of type `action`.
    pub fn from_ledger(action: ActionType, err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { needed, available } => {
                Self::InsufficientFunds { needed, available }
            }
            LedgerError::CapacityExhausted => Self::CapacityExceeded,
            LedgerError::UnknownAccount(id) => Self::UnknownTarget(id),
            LedgerError::SelfTransfer(_) => Self::InvalidPayload {
                action,
                reason: "receiver must differ from sender".to_owned(),
            },
            LedgerError::ZeroAmount => Self::InvalidPayload {
                action,
                reason: "amount must be positive".to_owned(),
            },
            LedgerError::BalanceOverflow(id) => Self::InvalidPayload {
                action,
                reason: format!("amount would overflow the balance of agent {id}"),
            },
        }
    }
}

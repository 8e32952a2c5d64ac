//! Queued action types.
//!
//! An [`Action`] is an agent's intent, queued at one tick and applied at the
//! next tick step. The payload is a tagged sum type so each action type
//! carries exactly the fields it needs. In persisted form the tag and the
//! payload sit next to the envelope fields:
//!
//! ```json
//! {"queued_at_tick": 3, "agent_id": 1, "type": "move", "payload": {"to": "market"}}
//! ```
//!
//! Amounts are signed because a queued action may come from an externally
//! edited snapshot. Non-positive amounts are valid data here and are
//! rejected when the action is applied.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ActionType;
use crate::ids::AgentId;

/// Action-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionPayload {
    /// Parameters for [`ActionType::Move`].
    Move {
        /// Destination location name.
        to: String,
    },
    /// Parameters for [`ActionType::Earn`].
    Earn {
        /// Amount credited when the earn succeeds.
        amount: i64,
    },
    /// Parameters for [`ActionType::Say`].
    Say {
        /// What the agent says.
        text: String,
    },
    /// Parameters for [`ActionType::Transfer`].
    Transfer {
        /// The receiving agent.
        to_agent_id: AgentId,
        /// Amount moved from sender to receiver.
        amount: i64,
    },
}

impl ActionPayload {
    /// Shorthand for a move payload.
    pub fn move_to(to: impl Into<String>) -> Self {
        Self::Move { to: to.into() }
    }

    /// Shorthand for an earn payload.
    pub const fn earn(amount: i64) -> Self {
        Self::Earn { amount }
    }

    /// Shorthand for a say payload.
    pub fn say(text: impl Into<String>) -> Self {
        Self::Say { text: text.into() }
    }

    /// Shorthand for a transfer payload.
    pub const fn transfer(to_agent_id: AgentId, amount: i64) -> Self {
        Self::Transfer {
            to_agent_id,
            amount,
        }
    }

    /// The action type this payload belongs to.
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::Move { .. } => ActionType::Move,
            Self::Earn { .. } => ActionType::Earn,
            Self::Say { .. } => ActionType::Say,
            Self::Transfer { .. } => ActionType::Transfer,
        }
    }
}

/// A queued agent action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Action {
    /// The tick at which the action was queued.
    pub queued_at_tick: u64,
    /// The acting agent. Resolved when the action is applied.
    pub agent_id: AgentId,
    /// Type tag and type-specific parameters.
    #[serde(flatten)]
    pub payload: ActionPayload,
}

impl Action {
    /// The action type of the payload.
    pub const fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }
}

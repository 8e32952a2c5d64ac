//! Enumeration types for the worldtick simulation.
//!
//! Every enum here serializes in `snake_case` so persisted snapshots and
//! audit log tags stay readable and match the tag strings used by the
//! explanation formatter.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The kind of action an agent can queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionType {
    /// Travel to another location, paying the move cost.
    Move,
    /// Work at the workshop, consuming one unit of capacity.
    Earn,
    /// Speak at the current location. Only touches the audit log.
    Say,
    /// Send part of the balance to another agent.
    Transfer,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [Self; 4] = [Self::Move, Self::Earn, Self::Say, Self::Transfer];

    /// The tag used in snapshots and the audit log.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Earn => "earn",
            Self::Say => "say",
            Self::Transfer => "transfer",
        }
    }

    /// Parse a tag, returning `None` for anything unrecognized.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// The goal that drives an autonomous agent's policy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Goal {
    /// Go to the workshop and earn there.
    #[default]
    Earn,
    /// Walk the location cycle.
    Wander,
    /// Do nothing.
    Idle,
}

impl Goal {
    /// The tag used in snapshots and the audit log.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Wander => "wander",
            Self::Idle => "idle",
        }
    }

    /// Parse a goal tag. Unknown values normalize to [`Goal::Earn`].
    pub fn from_tag_or_default(tag: &str) -> Self {
        match tag {
            "wander" => Self::Wander,
            "idle" => Self::Idle,
            _ => Self::Earn,
        }
    }
}

impl core::fmt::Display for Goal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an agent participates in autonomy and bulk controls.
///
/// Only [`AgentStatus::Active`] agents participate. A status this build does
/// not know is kept verbatim so a later save writes it back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// Normal, participating agent.
    #[default]
    Active,
    /// Sitting out.
    Inactive,
    /// Any other status loaded from a snapshot.
    #[serde(untagged)]
    Other(String),
}

impl AgentStatus {
    /// Parse a status tag. Unknown tags are kept as [`AgentStatus::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The status as written in snapshots.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Other(tag) => tag,
        }
    }
}

/// Why an agent carries a pending reaction for its next decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DenialReason {
    /// An earn was denied because the workshop ran out of capacity.
    Capacity,
}

impl DenialReason {
    /// The tag used in snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
        }
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Tag of an audit log event.
///
/// Tags not known to this build (for example from a newer snapshot) load
/// as [`EventKind::Other`]; the log event keeps the tag text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// An agent joined the world.
    Join,
    /// An action passed validation and was queued.
    QueuedAction,
    /// A tick step finished.
    Tick,
    /// An agent moved.
    Move,
    /// The move cost was debited.
    MoveCost,
    /// A queued move named an unknown location.
    MoveDeniedInvalidPayload,
    /// A queued move could not pay the move cost.
    MoveDeniedInsufficientFunds,
    /// An agent earned at the workshop.
    Earn,
    /// An earn was attempted away from the workshop.
    EarnDeniedWrongLocation,
    /// An earn was attempted with no capacity left this tick.
    EarnDeniedCapacity,
    /// A queued earn carried a non-positive amount.
    EarnDeniedInvalidAmount,
    /// A cooldown penalty was applied after a capacity denial.
    CooldownPenalty,
    /// An agent spoke.
    Say,
    /// A balance transfer was applied.
    Transfer,
    /// A transfer named a receiver that no longer exists.
    TransferDeniedUnknownTarget,
    /// A transfer named the sender as receiver.
    TransferDeniedSelf,
    /// A transfer carried a non-positive amount.
    TransferDeniedInvalidAmount,
    /// A transfer exceeded the sender's balance.
    TransferDeniedInsufficientFunds,
    /// A transfer would overflow the receiver's balance.
    TransferDeniedBalanceOverflow,
    /// A queued action referenced an agent that does not exist.
    ActionSkippedUnknownAgent,
    /// The autonomy policy made a decision.
    AutoDecision,
    /// Autonomy was enabled for one agent.
    AutoEnabled,
    /// Autonomy was disabled for one agent.
    AutoDisabled,
    /// Autonomy was enabled for all active agents.
    AutoEnabledAll,
    /// Autonomy was disabled for all agents.
    AutoDisabledAll,
    /// An agent's goal was changed.
    GoalSet,
    /// The world was reset.
    Reset,
    /// A scenario was loaded.
    ScenarioLoaded,
    /// A snapshot was saved.
    PersistSave,
    /// A snapshot was loaded.
    PersistLoad,
    /// A paid entry transaction was verified and recorded.
    EntryVerified,
    /// A tag this build does not know.
    #[serde(other)]
    Other,
}

impl EventKind {
    /// The tag string written to the audit log.
    #[allow(clippy::too_many_lines)]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::QueuedAction => "queued_action",
            Self::Tick => "tick",
            Self::Move => "move",
            Self::MoveCost => "move_cost",
            Self::MoveDeniedInvalidPayload => "move_denied_invalid_payload",
            Self::MoveDeniedInsufficientFunds => "move_denied_insufficient_funds",
            Self::Earn => "earn",
            Self::EarnDeniedWrongLocation => "earn_denied_wrong_location",
            Self::EarnDeniedCapacity => "earn_denied_capacity",
            Self::EarnDeniedInvalidAmount => "earn_denied_invalid_amount",
            Self::CooldownPenalty => "cooldown_penalty",
            Self::Say => "say",
            Self::Transfer => "transfer",
            Self::TransferDeniedUnknownTarget => "transfer_denied_unknown_target",
            Self::TransferDeniedSelf => "transfer_denied_self",
            Self::TransferDeniedInvalidAmount => "transfer_denied_invalid_amount",
            Self::TransferDeniedInsufficientFunds => "transfer_denied_insufficient_funds",
            Self::TransferDeniedBalanceOverflow => "transfer_denied_balance_overflow",
            Self::ActionSkippedUnknownAgent => "action_skipped_unknown_agent",
            Self::AutoDecision => "auto_decision",
            Self::AutoEnabled => "auto_enabled",
            Self::AutoDisabled => "auto_disabled",
            Self::AutoEnabledAll => "auto_enabled_all",
            Self::AutoDisabledAll => "auto_disabled_all",
            Self::GoalSet => "goal_set",
            Self::Reset => "reset",
            Self::ScenarioLoaded => "scenario_loaded",
            Self::PersistSave => "persist_save",
            Self::PersistLoad => "persist_load",
            Self::EntryVerified => "entry_verified",
            Self::Other => "other",
        }
    }

    /// Whether this event records an apply-time denial.
    pub const fn is_denial(self) -> bool {
        matches!(
            self,
            Self::MoveDeniedInvalidPayload
                | Self::MoveDeniedInsufficientFunds
                | Self::EarnDeniedWrongLocation
                | Self::EarnDeniedCapacity
                | Self::EarnDeniedInvalidAmount
                | Self::TransferDeniedUnknownTarget
                | Self::TransferDeniedSelf
                | Self::TransferDeniedInvalidAmount
                | Self::TransferDeniedInsufficientFunds
                | Self::TransferDeniedBalanceOverflow
        )
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

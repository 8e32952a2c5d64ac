//! Core entity structs: agents, the economy, the entry registry, and
//! audit log events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::enums::{AgentStatus, DenialReason, EventKind, Goal};
use crate::ids::AgentId;

/// The location every new agent starts at.
pub const SPAWN_LOCATION: &str = "spawn";

/// The only location where `earn` succeeds.
pub const WORKSHOP_LOCATION: &str = "workshop";

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A one-shot reaction the autonomy policy owes an agent after a denial.
///
/// Valid for the tick of the denial and the tick after it. The next
/// autonomy decision for the agent always clears it, fired or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PendingReaction {
    /// What was denied.
    pub reason: DenialReason,
    /// The tick the denial happened at.
    pub denied_at_tick: u64,
}

impl PendingReaction {
    /// Whether the reaction may still fire at `tick`.
    pub const fn is_fresh_at(&self, tick: u64) -> bool {
        tick <= self.denied_at_tick.saturating_add(1)
    }
}

/// An agent living in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Unique id, assigned as `max(existing) + 1`.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Spendable balance. Never negative.
    pub balance_mon: u64,
    /// Current location name. Always one of the world's locations.
    pub pos: String,
    /// Participation status.
    pub status: AgentStatus,
    /// Item names held by the agent.
    pub inventory: Vec<String>,
    /// Whether the autonomy policy acts for this agent.
    pub auto: bool,
    /// What the autonomy policy is trying to achieve.
    pub goal: Goal,
    /// The policy is skipped while `tick < cooldown_until_tick`.
    pub cooldown_until_tick: u64,
    /// Reaction owed after a capacity denial, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_reaction: Option<PendingReaction>,
}

impl Agent {
    /// Create a fresh active agent at the spawn location.
    pub fn new(id: AgentId, name: impl Into<String>, balance_mon: u64) -> Self {
        Self {
            id,
            name: name.into(),
            balance_mon,
            pos: SPAWN_LOCATION.to_owned(),
            status: AgentStatus::Active,
            inventory: Vec::new(),
            auto: false,
            goal: Goal::Earn,
            cooldown_until_tick: 0,
            pending_reaction: None,
        }
    }

    /// Whether the agent is active.
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Whether the autonomy policy should run for this agent.
    pub fn is_autonomous(&self) -> bool {
        self.auto && self.is_active()
    }
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// The renewable workshop capacity.
///
/// `capacity_left` is refilled to `capacity_per_tick` at the start of every
/// tick step. Unused capacity is not carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Economy {
    /// Successful earns allowed per tick step. At least 1.
    #[serde(rename = "workshop_capacity_per_tick")]
    pub capacity_per_tick: u32,
    /// Earns still allowed in the current tick step.
    #[serde(rename = "workshop_capacity_left")]
    pub capacity_left: u32,
}

impl Economy {
    /// Create an economy with full capacity. A zero capacity becomes 1.
    pub fn new(capacity_per_tick: u32) -> Self {
        let per_tick = capacity_per_tick.max(1);
        Self {
            capacity_per_tick: per_tick,
            capacity_left: per_tick,
        }
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(1)
    }
}

// ---------------------------------------------------------------------------
// Entry registry
// ---------------------------------------------------------------------------

/// Replay protection for paid entries: every transaction hash already used
/// to join. Survives resets when the caller asks to preserve it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntryRegistry {
    /// Normalized (lower-case) transaction hashes.
    pub used_tx_hashes: BTreeSet<String>,
}

impl EntryRegistry {
    /// Whether the normalized hash was already used.
    pub fn is_used(&self, tx_hash: &str) -> bool {
        self.used_tx_hashes.contains(tx_hash)
    }
}

// ---------------------------------------------------------------------------
// Audit log events
// ---------------------------------------------------------------------------

/// One entry of the audit log.
///
/// Serializes as `{time, tick, event, data}`. An event whose tag this build
/// does not know loads as [`EventKind::Other`] and keeps the tag in
/// `raw_event`, which is what gets written back.
#[derive(Debug, Clone, PartialEq, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEvent {
    /// Wall-clock time of emission. Informational only.
    pub time: DateTime<Utc>,
    /// Simulation tick at emission.
    pub tick: u64,
    /// Event tag.
    pub event: EventKind,
    /// The tag as loaded, set only for [`EventKind::Other`].
    #[ts(skip)]
    pub raw_event: Option<String>,
    /// Event-specific fields.
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
struct LogEventFields {
    time: DateTime<Utc>,
    tick: u64,
    event: String,
    data: serde_json::Value,
}

impl Serialize for LogEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("LogEvent", 4)?;
        out.serialize_field("time", &self.time)?;
        out.serialize_field("tick", &self.tick)?;
        out.serialize_field("event", self.tag())?;
        out.serialize_field("data", &self.data)?;
        out.end()
    }
}

impl<'de> Deserialize<'de> for LogEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = LogEventFields::deserialize(deserializer)?;
        Ok(Self::with_tag(fields.time, fields.tick, &fields.event, fields.data))
    }
}

impl LogEvent {
    /// Create an event of a known kind.
    pub const fn new(
        time: DateTime<Utc>,
        tick: u64,
        event: EventKind,
        data: serde_json::Value,
    ) -> Self {
        Self {
            time,
            tick,
            event,
            raw_event: None,
            data,
        }
    }

    /// Create an event from its tag text, keeping tags this build does not
    /// know.
    pub fn with_tag(time: DateTime<Utc>, tick: u64, tag: &str, data: serde_json::Value) -> Self {
        let event = serde_json::from_value(serde_json::Value::String(tag.to_owned()))
            .unwrap_or(EventKind::Other);
        let mut log_event = Self::new(time, tick, event, data);
        if event == EventKind::Other && tag != EventKind::Other.as_str() {
            log_event.raw_event = Some(tag.to_owned());
        }
        log_event
    }

    /// The event tag as it is written out.
    pub fn tag(&self) -> &str {
        match (&self.raw_event, self.event) {
            (Some(raw), EventKind::Other) => raw,
            (_, event) => event.as_str(),
        }
    }

    /// The `agent_id` field of the event data, if present.
    pub fn agent_id(&self) -> Option<AgentId> {
        self.data
            .get("agent_id")
            .and_then(serde_json::Value::as_u64)
            .map(AgentId)
    }
}

//! The world state and its read-only views.
//!
//! [`WorldState`] is the single mutable aggregate of the simulation. It is
//! owned by the [`WorldStore`](crate::store::WorldStore) and only reached
//! through it; the functions in this crate that take `&mut WorldState` run
//! with the store's lock already held.

use serde::Serialize;
use serde_json::Value;
use worldtick_types::{Action, Agent, Economy, EntryRegistry, EventKind};

use crate::audit::{AuditLog, MAX_LOGS};

/// Locations of a default world, in cyclic order.
pub const DEFAULT_LOCATIONS: [&str; 3] = ["spawn", "market", "workshop"];

/// The parameters a fresh world is built from.
///
/// Kept by the store so that resets and snapshot loads rebuild the same
/// world shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSettings {
    /// Location names in cyclic order.
    pub locations: Vec<String>,
    /// Audit log capacity.
    pub max_logs: usize,
    /// Workshop capacity refilled each tick step.
    pub capacity_per_tick: u32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            locations: DEFAULT_LOCATIONS.iter().map(|l| (*l).to_owned()).collect(),
            max_logs: MAX_LOGS,
            capacity_per_tick: 1,
        }
    }
}

/// The complete mutable state of the world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    /// Number of completed tick steps.
    pub tick: u64,
    /// Valid location names in cyclic order.
    pub locations: Vec<String>,
    /// Agents in join order.
    pub agents: Vec<Agent>,
    /// Actions waiting for the next tick step, in FIFO order.
    pub action_queue: Vec<Action>,
    /// Workshop capacity.
    pub economy: Economy,
    /// The audit log.
    pub logs: AuditLog,
    /// Transaction hashes already used for paid entry.
    pub entry: EntryRegistry,
}

impl WorldState {
    /// A fresh world at tick 0 with no agents.
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            tick: 0,
            locations: settings.locations.clone(),
            agents: Vec::new(),
            action_queue: Vec::new(),
            economy: Economy::new(settings.capacity_per_tick),
            logs: AuditLog::new(settings.max_logs),
            entry: EntryRegistry::default(),
        }
    }

    /// Append an audit event at the current tick.
    pub fn log(&mut self, event: EventKind, data: Value) {
        self.logs.record(self.tick, event, data);
    }

    /// Counters describing the world.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            tick: self.tick,
            agents: self.agents.len(),
            queued_actions: self.action_queue.len(),
            logs: self.logs.len(),
            locations: self.locations.len(),
            workshop_capacity_per_tick: self.economy.capacity_per_tick,
            workshop_capacity_left: self.economy.capacity_left,
            total_balance_mon: self
                .agents
                .iter()
                .fold(0_u64, |acc, a| acc.saturating_add(a.balance_mon)),
        }
    }

    /// A copy of the world without its log and queue contents.
    pub fn view(&self) -> WorldView {
        WorldView {
            tick: self.tick,
            locations: self.locations.clone(),
            agents: self.agents.clone(),
            queued_actions: self.action_queue.len(),
            logs: self.logs.len(),
        }
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(&WorldSettings::default())
    }
}

/// Summary counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Current tick.
    pub tick: u64,
    /// Number of agents.
    pub agents: usize,
    /// Number of queued actions.
    pub queued_actions: usize,
    /// Number of retained log events.
    pub logs: usize,
    /// Number of locations.
    pub locations: usize,
    /// Workshop capacity per tick step.
    pub workshop_capacity_per_tick: u32,
    /// Workshop capacity left in the current step.
    pub workshop_capacity_left: u32,
    /// Sum of all agent balances.
    pub total_balance_mon: u64,
}

/// The world as shown to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldView {
    /// Current tick.
    pub tick: u64,
    /// Location names.
    pub locations: Vec<String>,
    /// All agents.
    pub agents: Vec<Agent>,
    /// Number of queued actions.
    pub queued_actions: usize,
    /// Number of retained log events.
    pub logs: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use worldtick_types::AgentId;

    use super::*;

    #[test]
    fn fresh_world_matches_settings() {
        let state = WorldState::default();
        assert_eq!(state.tick, 0);
        assert_eq!(state.locations, vec!["spawn", "market", "workshop"]);
        assert_eq!(state.economy, Economy::new(1));
        assert_eq!(state.logs.capacity(), MAX_LOGS);
    }

    #[test]
    fn metrics_sum_balances() {
        let mut state = WorldState::default();
        state.agents.push(Agent::new(AgentId(1), "a", 10));
        state.agents.push(Agent::new(AgentId(2), "b", 2));
        state.log(EventKind::Reset, json!({}));

        let metrics = state.metrics();
        assert_eq!(metrics.agents, 2);
        assert_eq!(metrics.total_balance_mon, 12);
        assert_eq!(metrics.logs, 1);
        assert_eq!(metrics.locations, 3);
    }
}

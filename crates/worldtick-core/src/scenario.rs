//! Preset worlds for demos and tests.

use serde_json::json;
use tracing::info;
use worldtick_agents::{AgentError, agent};
use worldtick_types::{Agent, EventKind, Goal};

use crate::state::WorldState;

/// A named preset world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Three agents with different balances, all manual.
    Basic,
    /// The same three agents, autonomous, with goals earn, wander, earn.
    BasicAuto,
}

/// The agents every scenario starts with, and the goal each pursues when
/// autonomous.
const ROSTER: [(&str, u64, Goal); 3] = [
    ("alice", 10, Goal::Earn),
    ("bob", 2, Goal::Wander),
    ("charlie", 0, Goal::Earn),
];

impl Scenario {
    /// Look a scenario up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "basic" => Some(Self::Basic),
            "basic_auto" => Some(Self::BasicAuto),
            _ => None,
        }
    }

    /// The scenario's name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::BasicAuto => "basic_auto",
        }
    }

    /// Populate a freshly reset world, logging a `join` per agent and a
    /// final `scenario_loaded`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::IdExhausted`] only if the world already holds
    /// an agent with the largest possible id.
    pub fn populate(self, state: &mut WorldState) -> Result<(), AgentError> {
        for (name, deposit, goal) in ROSTER {
            let mut new_agent: Agent = agent::create_agent(&state.agents, name, deposit)?;
            if self == Self::BasicAuto {
                new_agent.auto = true;
                new_agent.goal = goal;
            }
            state.log(
                EventKind::Join,
                json!({
                    "agent_id": new_agent.id,
                    "name": new_agent.name,
                    "deposit_mon": deposit,
                }),
            );
            state.agents.push(new_agent);
        }

        state.log(
            EventKind::ScenarioLoaded,
            json!({ "name": self.as_str(), "agents": state.agents.len() }),
        );
        info!(scenario = self.as_str(), agents = state.agents.len(), "scenario loaded");
        Ok(())
    }
}

impl core::fmt::Display for Scenario {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use worldtick_types::AgentId;

    use super::*;

    #[test]
    fn names_round_trip() {
        for scenario in [Scenario::Basic, Scenario::BasicAuto] {
            assert_eq!(Scenario::from_name(scenario.as_str()), Some(scenario));
        }
        assert_eq!(Scenario::from_name("chaos"), None);
    }

    #[test]
    fn basic_adds_three_manual_agents() {
        let mut state = WorldState::default();
        Scenario::Basic.populate(&mut state).unwrap();

        let summary: Vec<(AgentId, &str, u64, bool)> = state
            .agents
            .iter()
            .map(|a| (a.id, a.name.as_str(), a.balance_mon, a.auto))
            .collect();
        assert_eq!(
            summary,
            vec![
                (AgentId(1), "alice", 10, false),
                (AgentId(2), "bob", 2, false),
                (AgentId(3), "charlie", 0, false),
            ]
        );
        assert!(state.agents.iter().all(|a| a.goal == Goal::Earn));
        assert_eq!(state.logs.len(), 4);
    }

    #[test]
    fn basic_auto_sets_goals() {
        let mut state = WorldState::default();
        Scenario::BasicAuto.populate(&mut state).unwrap();
        let goals: Vec<Goal> = state.agents.iter().map(|a| a.goal).collect();
        assert_eq!(goals, vec![Goal::Earn, Goal::Wander, Goal::Earn]);
        assert!(state.agents.iter().all(|a| a.auto));
    }
}

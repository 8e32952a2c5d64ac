//! The autonomy step: run the policy for every eligible agent.

use serde::Serialize;
use serde_json::json;
use tracing::debug;
use worldtick_agents::{agent, apply_decision, decide};
use worldtick_types::{Action, AgentId, EventKind};

use crate::error::CoreError;
use crate::queue;
use crate::state::WorldState;
use crate::tick::{self, TickReport};

/// Largest agent limit accepted by one autonomy step.
pub const MAX_LIMIT_AGENTS: usize = 500;

/// What one autonomy step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoStepReport {
    /// The tick the decisions were made at.
    pub tick: u64,
    /// Actions queued by the step, in agent order.
    pub generated_actions: Vec<Action>,
}

/// An autonomy step followed by one tick step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoTickReport {
    /// The autonomy step.
    pub auto: AutoStepReport,
    /// The tick step that applied its actions.
    pub tick: TickReport,
}

/// Check an autonomy agent limit.
///
/// # Errors
///
/// Returns [`CoreError::InvalidLimit`] unless `1 <= limit <= MAX_LIMIT_AGENTS`.
pub const fn check_limit(limit: usize) -> Result<(), CoreError> {
    if limit == 0 || limit > MAX_LIMIT_AGENTS {
        return Err(CoreError::InvalidLimit {
            limit,
            max: MAX_LIMIT_AGENTS,
        });
    }
    Ok(())
}

/// Run the policy for up to `limit` autonomous agents, in agent order.
///
/// Every evaluated agent gets exactly one `auto_decision` event. An intent
/// the queue refuses becomes a no-op decision carrying the reason.
///
/// # Errors
///
/// Returns [`CoreError::InvalidLimit`] for an out-of-range limit.
pub fn run_auto_step(state: &mut WorldState, limit: usize) -> Result<AutoStepReport, CoreError> {
    check_limit(limit)?;

    let tick = state.tick;
    let eligible: Vec<AgentId> = state
        .agents
        .iter()
        .filter(|a| a.is_autonomous())
        .take(limit)
        .map(|a| a.id)
        .collect();

    let mut generated_actions = Vec::new();
    for agent_id in eligible {
        let Some(current) = agent::find(&state.agents, agent_id) else {
            continue;
        };
        let mut decision = decide(current, tick, &state.locations);

        let chosen = match decision.intent.clone() {
            Some(payload) => match queue::enqueue(state, agent_id, payload) {
                Ok(action) => Some(action),
                Err(err) => {
                    decision = decision.rejected(&err.to_string());
                    None
                }
            },
            None => None,
        };

        if let Some(current) = agent::find_mut(&mut state.agents, agent_id) {
            apply_decision(current, &decision);
        }

        debug!(
            agent_id = %agent_id,
            goal = %decision.goal,
            reason = %decision.reason,
            tick,
            "auto decision"
        );
        state.log(
            EventKind::AutoDecision,
            json!({
                "agent_id": agent_id,
                "goal": decision.goal,
                "reason": decision.reason,
                "chosen": chosen,
            }),
        );

        if let Some(action) = chosen {
            generated_actions.push(action);
        }
    }

    Ok(AutoStepReport {
        tick,
        generated_actions,
    })
}

/// Run an autonomy step, then one tick step.
///
/// # Errors
///
/// Returns [`CoreError::InvalidLimit`] before anything runs, or
/// [`CoreError::TickOverflow`] from the tick step.
pub fn run_auto_tick(state: &mut WorldState, limit: usize) -> Result<AutoTickReport, CoreError> {
    let auto = run_auto_step(state, limit)?;
    let tick = tick::run_steps(state, 1)?;
    Ok(AutoTickReport { auto, tick })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use worldtick_types::{ActionPayload, Agent, AgentStatus, Goal};

    use super::*;

    fn auto_agent(id: u64, goal: Goal, balance: u64) -> Agent {
        let mut agent = Agent::new(AgentId(id), format!("agent-{id}"), balance);
        agent.auto = true;
        agent.goal = goal;
        agent
    }

    fn decisions(state: &WorldState) -> usize {
        state
            .logs
            .iter()
            .filter(|e| e.event == EventKind::AutoDecision)
            .count()
    }

    #[test]
    fn limit_is_bounded() {
        let mut state = WorldState::default();
        assert!(run_auto_step(&mut state, 0).is_err());
        assert!(run_auto_step(&mut state, MAX_LIMIT_AGENTS + 1).is_err());
        assert!(run_auto_step(&mut state, MAX_LIMIT_AGENTS).is_ok());
    }

    #[test]
    fn only_active_autonomous_agents_decide() {
        let mut state = WorldState::default();
        state.agents.push(auto_agent(1, Goal::Earn, 5));
        state.agents.push(Agent::new(AgentId(2), "manual", 5));
        let mut inactive = auto_agent(3, Goal::Earn, 5);
        inactive.status = AgentStatus::Inactive;
        state.agents.push(inactive);

        let report = run_auto_step(&mut state, 50).unwrap();
        assert_eq!(report.generated_actions.len(), 1);
        assert_eq!(decisions(&state), 1);
    }

    #[test]
    fn limit_caps_evaluated_agents() {
        let mut state = WorldState::default();
        for id in 1..=4 {
            state.agents.push(auto_agent(id, Goal::Idle, 0));
        }
        run_auto_step(&mut state, 2).unwrap();
        assert_eq!(decisions(&state), 2);
        assert_eq!(state.agents[1].cooldown_until_tick, 1);
        assert_eq!(state.agents[2].cooldown_until_tick, 0);
    }

    #[test]
    fn no_op_decisions_are_still_logged() {
        let mut state = WorldState::default();
        state.agents.push(auto_agent(1, Goal::Wander, 0));
        let report = run_auto_step(&mut state, 50).unwrap();
        assert!(report.generated_actions.is_empty());

        let event = state.logs.recent(1).pop().unwrap();
        assert_eq!(event.event, EventKind::AutoDecision);
        assert_eq!(event.data["reason"], "insufficient funds for move");
        assert!(event.data["chosen"].is_null());
    }

    #[test]
    fn refused_intent_becomes_a_no_op() {
        let mut state = WorldState::default();
        state.locations = vec!["spawn".to_owned(), "market".to_owned()];
        state.agents.push(auto_agent(1, Goal::Earn, 5));

        let report = run_auto_step(&mut state, 50).unwrap();
        assert!(report.generated_actions.is_empty());
        assert!(state.action_queue.is_empty());

        let event = state.logs.recent(1).pop().unwrap();
        let reason = event.data["reason"].as_str().unwrap();
        assert!(reason.contains("rejected"));
        assert_eq!(state.agents[0].cooldown_until_tick, 1);
    }

    #[test]
    fn auto_tick_applies_what_it_queued() {
        let mut state = WorldState::default();
        state.agents.push(auto_agent(1, Goal::Earn, 5));

        let report = run_auto_tick(&mut state, 50).unwrap();
        assert_eq!(
            report.auto.generated_actions[0].payload,
            ActionPayload::move_to("workshop")
        );
        assert_eq!(report.tick.tick, 1);
        assert_eq!(report.tick.applied_actions, 1);
        assert_eq!(state.agents[0].pos, "workshop");
        assert_eq!(state.agents[0].balance_mon, 4);
    }
}

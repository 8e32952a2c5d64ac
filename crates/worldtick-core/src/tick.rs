//! The tick processor.
//!
//! Each step runs to completion, in this order:
//!
//! 1. **Advance** -- `tick += 1`.
//! 2. **Refill** -- workshop capacity is reset to its per-tick value.
//! 3. **Drain** -- the queue is swapped for an empty one, so actions queued
//!    while the step runs (none, under the store lock) wait for the next.
//! 4. **Apply** -- each action, in FIFO order, through the handlers. Every
//!    outcome is written to the audit log; denials are not errors.
//! 5. **Summarize** -- a `tick` event with the number of applied actions.
//!    Denied actions are counted for the report but not logged again.
//!
//! Nothing inside a step can fail. The only error is running out of tick
//! numbers, checked before a step starts.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use worldtick_agents::{ApplyContext, apply_action};
use worldtick_ledger::reset_capacity;
use worldtick_types::EventKind;

use crate::error::CoreError;
use crate::state::WorldState;

/// Largest step count accepted by one call.
pub const MAX_STEPS: u32 = 100;

/// What a run of tick steps did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// The tick after the last step.
    pub tick: u64,
    /// Applied actions summed over all steps.
    pub applied_actions: u64,
    /// Actions refused by an economy or movement rule, summed over all steps.
    pub denied_actions: u64,
}

/// Run `steps` tick steps.
///
/// # Errors
///
/// - [`CoreError::InvalidSteps`] unless `1 <= steps <= MAX_STEPS`. No step
///   runs.
/// - [`CoreError::TickOverflow`] if the tick counter cannot advance. Steps
///   completed before that point stay applied.
pub fn run_steps(state: &mut WorldState, steps: u32) -> Result<TickReport, CoreError> {
    if steps == 0 || steps > MAX_STEPS {
        return Err(CoreError::InvalidSteps {
            steps,
            max: MAX_STEPS,
        });
    }

    let mut report = TickReport {
        tick: state.tick,
        applied_actions: 0,
        denied_actions: 0,
    };
    for _ in 0..steps {
        let one = step(state)?;
        report.tick = one.tick;
        report.applied_actions = report.applied_actions.saturating_add(one.applied_actions);
        report.denied_actions = report.denied_actions.saturating_add(one.denied_actions);
    }
    Ok(report)
}

/// Run one tick step and report what it applied and denied.
///
/// # Errors
///
/// Returns [`CoreError::TickOverflow`] if the tick counter is at its
/// maximum. The state is untouched in that case.
pub fn step(state: &mut WorldState) -> Result<TickReport, CoreError> {
    let tick = state
        .tick
        .checked_add(1)
        .ok_or(CoreError::TickOverflow { tick: state.tick })?;
    state.tick = tick;
    reset_capacity(&mut state.economy);

    let queue = std::mem::take(&mut state.action_queue);
    let queued = queue.len();

    let WorldState {
        agents,
        locations,
        economy,
        logs,
        ..
    } = state;
    let mut ctx = ApplyContext {
        agents,
        locations,
        economy,
        tick,
    };

    let mut applied: u64 = 0;
    let mut denied: u64 = 0;
    for action in &queue {
        let outcome = apply_action(&mut ctx, action);
        if outcome.applied {
            applied = applied.saturating_add(1);
        } else if outcome.events.iter().any(|(event, _)| event.is_denial()) {
            denied = denied.saturating_add(1);
        }
        for (event, data) in outcome.events {
            logs.record(tick, event, data);
        }
    }

    state.log(EventKind::Tick, json!({ "applied_actions": applied }));

    if queued > 0 {
        info!(tick, queued, applied, denied, "tick step complete");
    } else {
        debug!(tick, "tick step complete, queue empty");
    }
    Ok(TickReport {
        tick,
        applied_actions: applied,
        denied_actions: denied,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use worldtick_types::{Action, ActionPayload, Agent, AgentId};

    use super::*;

    fn queue(state: &mut WorldState, agent: u64, payload: ActionPayload) {
        state.action_queue.push(Action {
            queued_at_tick: state.tick,
            agent_id: AgentId(agent),
            payload,
        });
    }

    fn events(state: &WorldState) -> Vec<EventKind> {
        state.logs.iter().map(|e| e.event).collect()
    }

    #[test]
    fn step_counts_are_bounded() {
        let mut state = WorldState::default();
        assert!(matches!(
            run_steps(&mut state, 0),
            Err(CoreError::InvalidSteps { steps: 0, .. })
        ));
        assert!(run_steps(&mut state, MAX_STEPS + 1).is_err());
        assert_eq!(state.tick, 0);
        assert!(state.logs.is_empty());

        let report = run_steps(&mut state, MAX_STEPS).unwrap();
        assert_eq!(report.tick, u64::from(MAX_STEPS));
    }

    #[test]
    fn every_step_emits_a_tick_event() {
        let mut state = WorldState::default();
        run_steps(&mut state, 3).unwrap();
        assert_eq!(events(&state), vec![EventKind::Tick; 3]);
    }

    #[test]
    fn queue_is_drained_in_order() {
        let mut state = WorldState::default();
        state.agents.push(Agent::new(AgentId(1), "a", 3));
        queue(&mut state, 1, ActionPayload::say("first"));
        queue(&mut state, 1, ActionPayload::move_to("market"));
        queue(&mut state, 1, ActionPayload::say("last"));

        let report = run_steps(&mut state, 1).unwrap();
        assert_eq!(report.applied_actions, 3);
        assert!(state.action_queue.is_empty());
        assert_eq!(
            events(&state),
            vec![
                EventKind::Say,
                EventKind::MoveCost,
                EventKind::Move,
                EventKind::Say,
                EventKind::Tick,
            ]
        );
        let said: Vec<_> = state
            .logs
            .iter()
            .filter(|e| e.event == EventKind::Say)
            .map(|e| e.data["pos"].clone())
            .collect();
        assert_eq!(said, vec![json!("spawn"), json!("market")]);
    }

    #[test]
    fn capacity_is_refilled_every_step() {
        let mut state = WorldState::default();
        let mut agent = Agent::new(AgentId(1), "a", 0);
        agent.pos = "workshop".to_owned();
        state.agents.push(agent);
        state.economy.capacity_left = 0;

        queue(&mut state, 1, ActionPayload::earn(1));
        run_steps(&mut state, 1).unwrap();
        assert_eq!(state.agents[0].balance_mon, 1);
        assert_eq!(state.economy.capacity_left, 0);

        run_steps(&mut state, 1).unwrap();
        assert_eq!(state.economy.capacity_left, 1);
    }

    #[test]
    fn second_earn_in_a_step_hits_capacity() {
        let mut state = WorldState::default();
        let mut agent = Agent::new(AgentId(1), "a", 0);
        agent.pos = "workshop".to_owned();
        state.agents.push(agent);

        queue(&mut state, 1, ActionPayload::earn(3));
        queue(&mut state, 1, ActionPayload::earn(3));
        let report = run_steps(&mut state, 1).unwrap();

        assert_eq!(report.applied_actions, 1);
        assert_eq!(report.denied_actions, 1);
        assert_eq!(state.agents[0].balance_mon, 3);
        assert_eq!(state.agents[0].cooldown_until_tick, 3);
        assert!(events(&state).contains(&EventKind::EarnDeniedCapacity));
        assert!(events(&state).contains(&EventKind::CooldownPenalty));
    }

    #[test]
    fn unknown_agents_are_skipped() {
        let mut state = WorldState::default();
        queue(&mut state, 9, ActionPayload::say("ghost"));
        let report = run_steps(&mut state, 1).unwrap();
        assert_eq!(report.applied_actions, 0);
        assert_eq!(report.denied_actions, 0);
        assert_eq!(
            events(&state),
            vec![EventKind::ActionSkippedUnknownAgent, EventKind::Tick]
        );
    }

    #[test]
    fn tick_overflow_is_reported_without_changes() {
        let mut state = WorldState::default();
        state.tick = u64::MAX;
        assert!(matches!(
            step(&mut state),
            Err(CoreError::TickOverflow { tick: u64::MAX })
        ));
        assert!(state.logs.is_empty());
    }
}

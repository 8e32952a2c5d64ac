//! The action queue.
//!
//! Actions are validated against the current world, tagged with the tick
//! they were queued at, and appended in FIFO order. The tick processor
//! drains the whole queue at the start of each step.

use serde_json::json;
use tracing::debug;
use worldtick_agents::{AgentError, validate_enqueue};
use worldtick_types::{Action, ActionPayload, AgentId, EventKind};

use crate::state::WorldState;

/// Validate and queue an action, logging `queued_action`.
///
/// # Errors
///
/// Returns the [`AgentError`] from queue-time validation. Nothing is queued
/// or logged on error.
pub fn enqueue(
    state: &mut WorldState,
    agent_id: AgentId,
    payload: ActionPayload,
) -> Result<Action, AgentError> {
    validate_enqueue(&state.agents, &state.locations, agent_id, &payload)?;

    let action = Action {
        queued_at_tick: state.tick,
        agent_id,
        payload,
    };
    debug!(
        agent_id = %agent_id,
        action = %action.action_type(),
        tick = state.tick,
        "action queued"
    );
    state.log(EventKind::QueuedAction, json!(action));
    state.action_queue.push(action.clone());
    Ok(action)
}

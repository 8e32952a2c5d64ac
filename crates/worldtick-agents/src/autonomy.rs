//! Goal-driven autonomy policy.
//!
//! [`decide`] looks at one agent and the current tick and returns a
//! [`Decision`]: at most one intended action plus a human-readable reason.
//! It never fails and never touches the world. The caller queues the intent
//! through the normal validator, writes the decision to the audit log, and
//! applies the bookkeeping with [`apply_decision`].
//!
//! Evaluation order:
//!
//! 1. A fresh capacity denial (same tick or the tick before) triggers a
//!    one-shot move to the next location, ahead of the cooldown gate. A
//!    stale denial is dropped and evaluation falls through.
//! 2. `tick < cooldown_until_tick` yields no action.
//! 3. The goal picks the action: `idle` waits, `wander` cycles through
//!    locations, `earn` heads for the workshop and earns there.

use worldtick_ledger::{MOVE_COST_MON, can_afford_move};
use worldtick_types::{ActionPayload, Agent, DenialReason, Goal, WORKSHOP_LOCATION};

use crate::navigation::next_location;

/// Amount an autonomous earn requests.
pub const AUTO_EARN_AMOUNT: i64 = 1;

/// The outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The goal the agent held when deciding.
    pub goal: Goal,
    /// Why this decision was made.
    pub reason: String,
    /// The action to queue, if any.
    pub intent: Option<ActionPayload>,
    /// New cooldown threshold, if the decision sets one.
    pub cooldown_until_tick: Option<u64>,
}

impl Decision {
    fn wait(goal: Goal, reason: impl Into<String>) -> Self {
        Self {
            goal,
            reason: reason.into(),
            intent: None,
            cooldown_until_tick: None,
        }
    }

    fn act(goal: Goal, reason: impl Into<String>, intent: ActionPayload, tick: u64) -> Self {
        Self {
            goal,
            reason: reason.into(),
            intent: Some(intent),
            cooldown_until_tick: Some(tick.saturating_add(1)),
        }
    }

    const fn cooling(mut self, tick: u64) -> Self {
        self.cooldown_until_tick = Some(tick.saturating_add(1));
        self
    }

    /// Turn this decision into a no-op, keeping the goal and cooldown.
    ///
    /// Used when the intended action was refused by the queue validator.
    #[must_use]
    pub fn rejected(mut self, why: &str) -> Self {
        self.reason = format!("{} (rejected: {why})", self.reason);
        self.intent = None;
        self
    }
}

/// Decide what `agent` does at `tick`.
pub fn decide(agent: &Agent, tick: u64, locations: &[String]) -> Decision {
    let goal = agent.goal;
    let pos = agent.pos.as_str();

    let fresh_reaction = agent
        .pending_reaction
        .filter(|r| r.reason == DenialReason::Capacity && r.is_fresh_at(tick));
    if let Some(reaction) = fresh_reaction {
        let to = next_location(locations, pos);
        if !can_afford_move(agent.balance_mon) {
            return Decision::wait(
                goal,
                format!(
                    "capacity denied at tick {} -> cannot afford move (cost {MOVE_COST_MON})",
                    reaction.denied_at_tick
                ),
            );
        }
        return Decision::act(
            goal,
            format!(
                "capacity denied at tick {} -> move {pos} -> {to}",
                reaction.denied_at_tick
            ),
            ActionPayload::move_to(to),
            tick,
        );
    }

    if tick < agent.cooldown_until_tick {
        return Decision::wait(goal, format!("cooldown (until {})", agent.cooldown_until_tick));
    }

    match goal {
        Goal::Idle => Decision::wait(goal, "idle goal -> no action").cooling(tick),
        Goal::Wander => {
            if !can_afford_move(agent.balance_mon) {
                return Decision::wait(goal, "insufficient funds for move").cooling(tick);
            }
            let to = next_location(locations, pos);
            if to == pos {
                return Decision::wait(goal, format!("wander -> stay at {pos} (single location)"))
                    .cooling(tick);
            }
            Decision::act(
                goal,
                format!("wander -> move {pos} -> {to}"),
                ActionPayload::move_to(to),
                tick,
            )
        }
        Goal::Earn => {
            if pos == WORKSHOP_LOCATION {
                return Decision::act(
                    goal,
                    "in workshop -> earn",
                    ActionPayload::earn(AUTO_EARN_AMOUNT),
                    tick,
                );
            }
            if !can_afford_move(agent.balance_mon) {
                return Decision::wait(goal, "insufficient funds for move to workshop")
                    .cooling(tick);
            }
            Decision::act(
                goal,
                format!("not in workshop (pos={pos})"),
                ActionPayload::move_to(WORKSHOP_LOCATION),
                tick,
            )
        }
    }
}

/// Record a decision on the agent: any pending reaction is consumed and the
/// cooldown moves if the decision set one.
pub fn apply_decision(agent: &mut Agent, decision: &Decision) {
    agent.pending_reaction = None;
    if let Some(until) = decision.cooldown_until_tick {
        agent.cooldown_until_tick = until;
    }
}

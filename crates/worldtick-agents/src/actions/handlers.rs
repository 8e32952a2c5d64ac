//! Apply-time execution of queued actions.
//!
//! Each handler re-checks everything it reads, because a queued action may
//! have been loaded from an edited snapshot or may have waited while the
//! world changed. A failed check never aborts the step: the handler returns
//! an [`ActionOutcome`] carrying the denial event and the domain rejection
//! behind it, and leaves state untouched apart from the documented
//! penalties (capacity denial sets a cooldown and a pending reaction).
//!
//! Handlers do not write to the audit log themselves. The tick processor
//! appends the events of each outcome in order.

use serde_json::{Value, json};
use tracing::debug;
use worldtick_ledger::{self as ledger, LedgerError, MOVE_COST_MON};
use worldtick_types::{
    Action, ActionPayload, ActionType, Agent, AgentId, DenialReason, Economy, EventKind,
    PendingReaction, WORKSHOP_LOCATION,
};

use crate::agent;
use crate::error::AgentError;

/// Ticks a capacity denial pushes the agent's cooldown out to.
pub const CAPACITY_PENALTY_TICKS: u64 = 2;

/// World state a handler may read and change.
#[derive(Debug)]
pub struct ApplyContext<'a> {
    /// All agents, in world order.
    pub agents: &'a mut [Agent],
    /// Valid location names.
    pub locations: &'a [String],
    /// Workshop capacity for the running step.
    pub economy: &'a mut Economy,
    /// The tick being processed.
    pub tick: u64,
}

/// What applying one action produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Whether the action counts as applied for the tick summary.
    pub applied: bool,
    /// Audit events to append, in order.
    pub events: Vec<(EventKind, Value)>,
    /// The domain rejection behind a denial, if any.
    pub rejection: Option<AgentError>,
}

impl ActionOutcome {
    fn applied(events: Vec<(EventKind, Value)>) -> Self {
        Self {
            applied: true,
            events,
            rejection: None,
        }
    }

    fn denied(kind: EventKind, data: Value, rejection: AgentError) -> Self {
        Self {
            applied: false,
            events: vec![(kind, data)],
            rejection: Some(rejection),
        }
    }
}

/// Apply a single queued action.
pub fn apply_action(ctx: &mut ApplyContext<'_>, action: &Action) -> ActionOutcome {
    let agent_id = action.agent_id;
    if agent::find(ctx.agents, agent_id).is_none() {
        return ActionOutcome::denied(
            EventKind::ActionSkippedUnknownAgent,
            json!({ "agent_id": agent_id, "action": action }),
            AgentError::AgentNotFound(agent_id),
        );
    }

    let outcome = match &action.payload {
        ActionPayload::Move { to } => apply_move(ctx, agent_id, to),
        ActionPayload::Earn { amount } => apply_earn(ctx, agent_id, *amount),
        ActionPayload::Say { text } => apply_say(ctx, agent_id, text),
        ActionPayload::Transfer {
            to_agent_id,
            amount,
        } => apply_transfer(ctx, agent_id, *to_agent_id, *amount),
    };

    if let Some(rejection) = &outcome.rejection {
        debug!(
            agent_id = %agent_id,
            action = %action.action_type(),
            tick = ctx.tick,
            %rejection,
            "action denied"
        );
    }
    outcome
}

fn apply_move(ctx: &mut ApplyContext<'_>, agent_id: AgentId, to: &str) -> ActionOutcome {
    if !ctx.locations.iter().any(|l| l == to) {
        return ActionOutcome::denied(
            EventKind::MoveDeniedInvalidPayload,
            json!({ "agent_id": agent_id, "payload": { "to": to } }),
            AgentError::InvalidPayload {
                action: ActionType::Move,
                reason: format!("unknown location {to:?}"),
            },
        );
    }

    let Some(agent) = agent::find_mut(ctx.agents, agent_id) else {
        return unknown_agent(agent_id);
    };

    let balance_mon = match ledger::debit(agent, MOVE_COST_MON) {
        Ok(balance) => balance,
        Err(err) => {
            return ActionOutcome::denied(
                EventKind::MoveDeniedInsufficientFunds,
                json!({
                    "agent_id": agent_id,
                    "to": to,
                    "cost": MOVE_COST_MON,
                    "balance_mon": agent.balance_mon,
                }),
                AgentError::from_ledger(ActionType::Move, err),
            );
        }
    };

    let from = std::mem::replace(&mut agent.pos, to.to_owned());

    ActionOutcome::applied(vec![
        (
            EventKind::MoveCost,
            json!({ "agent_id": agent_id, "cost": MOVE_COST_MON, "balance_mon": balance_mon }),
        ),
        (
            EventKind::Move,
            json!({ "agent_id": agent_id, "from": from, "to": to }),
        ),
    ])
}

fn apply_earn(ctx: &mut ApplyContext<'_>, agent_id: AgentId, amount: i64) -> ActionOutcome {
    let tick = ctx.tick;
    let capacity_left = ctx.economy.capacity_left;
    let capacity_per_tick = ctx.economy.capacity_per_tick;

    let Some(agent) = agent::find_mut(ctx.agents, agent_id) else {
        return unknown_agent(agent_id);
    };

    if agent.pos != WORKSHOP_LOCATION {
        return ActionOutcome::denied(
            EventKind::EarnDeniedWrongLocation,
            json!({ "agent_id": agent_id, "pos": agent.pos }),
            AgentError::InvalidPayload {
                action: ActionType::Earn,
                reason: format!("earn requires {WORKSHOP_LOCATION}, agent is at {}", agent.pos),
            },
        );
    }

    if capacity_left == 0 {
        let penalty_until = tick.saturating_add(CAPACITY_PENALTY_TICKS);
        agent.cooldown_until_tick = agent.cooldown_until_tick.max(penalty_until);
        agent.pending_reaction = Some(PendingReaction {
            reason: DenialReason::Capacity,
            denied_at_tick: tick,
        });
        return ActionOutcome {
            applied: false,
            events: vec![
                (
                    EventKind::EarnDeniedCapacity,
                    json!({
                        "agent_id": agent_id,
                        "amount": amount,
                        "capacity_per_tick": capacity_per_tick,
                    }),
                ),
                (
                    EventKind::CooldownPenalty,
                    json!({
                        "agent_id": agent_id,
                        "reason": DenialReason::Capacity.as_str(),
                        "cooldown_until_tick": agent.cooldown_until_tick,
                    }),
                ),
            ],
            rejection: Some(AgentError::CapacityExceeded),
        };
    }

    let Some(credit) = u64::try_from(amount).ok().filter(|a| *a > 0) else {
        return ActionOutcome::denied(
            EventKind::EarnDeniedInvalidAmount,
            json!({ "agent_id": agent_id, "amount": amount }),
            AgentError::InvalidPayload {
                action: ActionType::Earn,
                reason: "amount must be positive".to_owned(),
            },
        );
    };

    let balance_mon = match ledger::credit(agent, credit) {
        Ok(balance) => balance,
        Err(err) => {
            return ActionOutcome::denied(
                EventKind::EarnDeniedInvalidAmount,
                json!({ "agent_id": agent_id, "amount": amount }),
                AgentError::from_ledger(ActionType::Earn, err),
            );
        }
    };

    // Capacity was checked above; exhaustion here would mean a logic error.
    let capacity_left = ledger::try_consume_capacity(ctx.economy).unwrap_or(0);

    ActionOutcome::applied(vec![(
        EventKind::Earn,
        json!({
            "agent_id": agent_id,
            "amount": credit,
            "balance_mon": balance_mon,
            "capacity_left": capacity_left,
        }),
    )])
}

fn apply_say(ctx: &ApplyContext<'_>, agent_id: AgentId, text: &str) -> ActionOutcome {
    let Some(agent) = agent::find(ctx.agents, agent_id) else {
        return unknown_agent(agent_id);
    };
    ActionOutcome::applied(vec![(
        EventKind::Say,
        json!({ "agent_id": agent_id, "text": text, "pos": agent.pos }),
    )])
}

fn apply_transfer(
    ctx: &mut ApplyContext<'_>,
    agent_id: AgentId,
    to_agent_id: AgentId,
    amount: i64,
) -> ActionOutcome {
    if agent::find(ctx.agents, to_agent_id).is_none() {
        return ActionOutcome::denied(
            EventKind::TransferDeniedUnknownTarget,
            json!({ "agent_id": agent_id, "to_agent_id": to_agent_id, "amount": amount }),
            AgentError::UnknownTarget(to_agent_id),
        );
    }

    if to_agent_id == agent_id {
        return ActionOutcome::denied(
            EventKind::TransferDeniedSelf,
            json!({ "agent_id": agent_id, "amount": amount }),
            AgentError::InvalidPayload {
                action: ActionType::Transfer,
                reason: "receiver must differ from sender".to_owned(),
            },
        );
    }

    let Some(value) = u64::try_from(amount).ok().filter(|a| *a > 0) else {
        return ActionOutcome::denied(
            EventKind::TransferDeniedInvalidAmount,
            json!({ "agent_id": agent_id, "to_agent_id": to_agent_id, "amount": amount }),
            AgentError::InvalidPayload {
                action: ActionType::Transfer,
                reason: "amount must be positive".to_owned(),
            },
        );
    };

    match ledger::transfer(ctx.agents, agent_id, to_agent_id, value) {
        Ok(receipt) => ActionOutcome::applied(vec![(
            EventKind::Transfer,
            json!({
                "agent_id": agent_id,
                "to_agent_id": to_agent_id,
                "amount": value,
                "balance_mon": receipt.from_balance,
                "to_balance_mon": receipt.to_balance,
            }),
        )]),
        Err(err) => {
            let event = match err {
                LedgerError::InsufficientFunds { .. } => EventKind::TransferDeniedInsufficientFunds,
                LedgerError::BalanceOverflow(_) => EventKind::TransferDeniedBalanceOverflow,
                LedgerError::UnknownAccount(_) => EventKind::TransferDeniedUnknownTarget,
                LedgerError::SelfTransfer(_) => EventKind::TransferDeniedSelf,
                LedgerError::ZeroAmount | LedgerError::CapacityExhausted => {
                    EventKind::TransferDeniedInvalidAmount
                }
            };
            let balance_of = |id| agent::find(ctx.agents, id).map_or(0, |a| a.balance_mon);
            ActionOutcome::denied(
                event,
                json!({
                    "agent_id": agent_id,
                    "to_agent_id": to_agent_id,
                    "amount": value,
                    "balance_mon": balance_of(agent_id),
                    "to_balance_mon": balance_of(to_agent_id),
                }),
                AgentError::from_ledger(ActionType::Transfer, err),
            )
        }
    }
}

fn unknown_agent(agent_id: AgentId) -> ActionOutcome {
    ActionOutcome::denied(
        EventKind::ActionSkippedUnknownAgent,
        json!({ "agent_id": agent_id }),
        AgentError::AgentNotFound(agent_id),
    )
}

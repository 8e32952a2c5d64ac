//! Queue-time validation.
//!
//! An action is checked once when it is queued, against the world as it is
//! at that moment:
//!
//! 1. The acting agent exists.
//! 2. The payload is structurally sound for its type.
//!
//! Passing here does not guarantee the action applies. The world can change
//! before the next tick step (the receiver of a transfer can vanish, the
//! workshop can fill up), so the handlers check again.
//!
//! [`parse_payload`] covers transports that deliver a type tag and a loose
//! JSON object instead of an [`ActionPayload`].

use serde_json::Value;
use worldtick_types::{ActionPayload, ActionType, Agent, AgentId};

use crate::agent;
use crate::error::AgentError;

/// Validate an action before it is queued.
///
/// # Errors
///
/// - [`AgentError::AgentNotFound`] if `agent_id` does not resolve.
/// - [`AgentError::InvalidPayload`] if the payload is not acceptable for
///   its action type.
pub fn validate_enqueue(
    agents: &[Agent],
    locations: &[String],
    agent_id: AgentId,
    payload: &ActionPayload,
) -> Result<(), AgentError> {
    agent::require(agents, agent_id)?;

    match payload {
        ActionPayload::Move { to } => {
            if !locations.iter().any(|l| l == to) {
                return Err(invalid(
                    ActionType::Move,
                    format!("payload.to must be one of: {}", locations.join(", ")),
                ));
            }
        }
        ActionPayload::Earn { amount } => {
            if *amount <= 0 {
                return Err(invalid(
                    ActionType::Earn,
                    "payload.amount must be a positive integer",
                ));
            }
        }
        ActionPayload::Say { text } => {
            if text.trim().is_empty() {
                return Err(invalid(
                    ActionType::Say,
                    "payload.text must be a non-empty string",
                ));
            }
        }
        ActionPayload::Transfer {
            to_agent_id,
            amount,
        } => {
            if !to_agent_id.is_valid() {
                return Err(invalid(
                    ActionType::Transfer,
                    "payload.to_agent_id must be a positive integer",
                ));
            }
            if *to_agent_id == agent_id {
                return Err(invalid(
                    ActionType::Transfer,
                    "payload.to_agent_id must differ from the sender",
                ));
            }
            if agent::find(agents, *to_agent_id).is_none() {
                return Err(invalid(
                    ActionType::Transfer,
                    format!("payload.to_agent_id {to_agent_id} does not exist"),
                ));
            }
            if *amount <= 0 {
                return Err(invalid(
                    ActionType::Transfer,
                    "payload.amount must be a positive integer",
                ));
            }
        }
    }

    Ok(())
}

/// Build a typed payload from an action type tag and a loose JSON object.
///
/// Only the shape is checked here: field presence and JSON types. Values
/// are checked by [`validate_enqueue`]. `earn.amount` defaults to 1 when
/// absent; a null or missing payload counts as an empty object.
///
/// # Errors
///
/// - [`AgentError::UnknownActionType`] for an unrecognized tag.
/// - [`AgentError::InvalidPayload`] for a field of the wrong JSON type.
pub fn parse_payload(type_tag: &str, payload: &Value) -> Result<ActionPayload, AgentError> {
    let action = ActionType::from_tag(type_tag)
        .ok_or_else(|| AgentError::UnknownActionType(type_tag.to_owned()))?;

    let empty = serde_json::Map::new();
    let fields = match payload {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(invalid(action, "payload must be an object")),
    };

    match action {
        ActionType::Move => {
            let to = fields
                .get("to")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(action, "payload.to must be a string"))?;
            Ok(ActionPayload::move_to(to))
        }
        ActionType::Earn => {
            let amount = match fields.get("amount") {
                None => 1,
                Some(v) => v
                    .as_i64()
                    .ok_or_else(|| invalid(action, "payload.amount must be an integer"))?,
            };
            Ok(ActionPayload::earn(amount))
        }
        ActionType::Say => {
            let text = fields
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(action, "payload.text must be a string"))?;
            Ok(ActionPayload::say(text))
        }
        ActionType::Transfer => {
            let to = fields
                .get("to_agent_id")
                .and_then(Value::as_u64)
                .ok_or_else(|| invalid(action, "payload.to_agent_id must be a positive integer"))?;
            let amount = fields
                .get("amount")
                .and_then(Value::as_i64)
                .ok_or_else(|| invalid(action, "payload.amount must be an integer"))?;
            Ok(ActionPayload::transfer(AgentId(to), amount))
        }
    }
}

fn invalid(action: ActionType, reason: impl Into<String>) -> AgentError {
    AgentError::InvalidPayload {
        action,
        reason: reason.into(),
    }
}

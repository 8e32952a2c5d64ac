//! Agent creation and lookup.
//!
//! Agents live in an ordered `Vec<Agent>` owned by the world state. These
//! helpers operate on that slice so the same rules apply to a live world and
//! to one freshly loaded from a snapshot.
//!
//! Ids are assigned as `max(existing) + 1`, never from a running counter,
//! so a loaded snapshot with gaps (ids `2, 5`) continues at `6`.

use worldtick_types::{Agent, AgentId};

use crate::error::AgentError;

/// Longest accepted agent name, in characters.
pub const MAX_NAME_CHARS: usize = 32;

/// Find an agent by id.
pub fn find(agents: &[Agent], id: AgentId) -> Option<&Agent> {
    agents.iter().find(|a| a.id == id)
}

/// Find an agent by id for mutation.
pub fn find_mut(agents: &mut [Agent], id: AgentId) -> Option<&mut Agent> {
    agents.iter_mut().find(|a| a.id == id)
}

/// Find an agent by id or fail with [`AgentError::AgentNotFound`].
///
/// # Errors
///
/// Returns [`AgentError::AgentNotFound`] if no agent has this id.
pub fn require(agents: &[Agent], id: AgentId) -> Result<&Agent, AgentError> {
    find(agents, id).ok_or(AgentError::AgentNotFound(id))
}

/// Find an agent by id for mutation or fail with [`AgentError::AgentNotFound`].
///
/// # Errors
///
/// Returns [`AgentError::AgentNotFound`] if no agent has this id.
pub fn require_mut(agents: &mut [Agent], id: AgentId) -> Result<&mut Agent, AgentError> {
    find_mut(agents, id).ok_or(AgentError::AgentNotFound(id))
}

/// The id the next joining agent receives.
///
/// # Errors
///
/// Returns [`AgentError::IdExhausted`] if the largest id is `u64::MAX`.
pub fn next_agent_id(agents: &[Agent]) -> Result<AgentId, AgentError> {
    agents
        .iter()
        .map(|a| a.id)
        .max()
        .unwrap_or_default()
        .next()
        .ok_or(AgentError::IdExhausted)
}

/// Check a requested agent name and return it trimmed.
///
/// # Errors
///
/// Returns [`AgentError::InvalidName`] if the trimmed name is empty or
/// longer than [`MAX_NAME_CHARS`].
pub fn validate_name(name: &str) -> Result<String, AgentError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AgentError::InvalidName {
            reason: "name must not be empty".to_owned(),
        });
    }
    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(AgentError::InvalidName {
            reason: format!("name is {chars} characters, limit is {MAX_NAME_CHARS}"),
        });
    }
    Ok(trimmed.to_owned())
}

/// Build the agent a join would add, without adding it.
///
/// # Errors
///
/// Returns [`AgentError::InvalidName`] or [`AgentError::IdExhausted`].
pub fn create_agent(agents: &[Agent], name: &str, deposit_mon: u64) -> Result<Agent, AgentError> {
    let name = validate_name(name)?;
    let id = next_agent_id(agents)?;
    Ok(Agent::new(id, name, deposit_mon))
}

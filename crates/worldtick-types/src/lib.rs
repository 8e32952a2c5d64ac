//! Shared type definitions for the worldtick simulation.
//!
//! This crate is the single source of truth for the entities every other
//! crate passes around. Types flow to `TypeScript` via `ts-rs` for
//! dashboards that render the world and its audit log.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe agent identifier
//! - [`enums`] -- Action types, goals, statuses, and audit event tags
//! - [`structs`] -- Agents, the economy, the entry registry, log events
//! - [`actions`] -- Queued actions and their tagged payloads

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, ActionPayload};
pub use enums::{ActionType, AgentStatus, DenialReason, EventKind, Goal};
pub use ids::AgentId;
pub use structs::{
    Agent, Economy, EntryRegistry, LogEvent, PendingReaction, SPAWN_LOCATION, WORKSHOP_LOCATION,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the shared types.

    #[test]
    fn export_bindings() {
        // Writes the `.ts` files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();

        let _ = crate::enums::ActionType::export_all();
        let _ = crate::enums::Goal::export_all();
        let _ = crate::enums::AgentStatus::export_all();
        let _ = crate::enums::DenialReason::export_all();
        let _ = crate::enums::EventKind::export_all();

        let _ = crate::structs::Agent::export_all();
        let _ = crate::structs::PendingReaction::export_all();
        let _ = crate::structs::Economy::export_all();
        let _ = crate::structs::EntryRegistry::export_all();
        let _ = crate::structs::LogEvent::export_all();

        let _ = crate::actions::Action::export_all();
        let _ = crate::actions::ActionPayload::export_all();
    }
}

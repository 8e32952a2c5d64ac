//! Agent roster, actions, and autonomy for the worldtick simulation.
//!
//! This crate holds the logic that operates on agents without owning the
//! world: it takes slices and references from the state store and never
//! locks, logs to the audit trail, or performs I/O.
//!
//! # Modules
//!
//! - [`actions`] -- Queue-time validation and apply-time handlers.
//! - [`agent`] -- Agent creation, lookup, and id assignment.
//! - [`autonomy`] -- The goal-driven policy ([`decide`]).
//! - [`error`] -- Domain rejections ([`AgentError`]).
//! - [`navigation`] -- Deterministic location cycling.

pub mod actions;
pub mod agent;
pub mod autonomy;
pub mod error;
pub mod navigation;

pub use actions::{
    ActionOutcome, ApplyContext, apply_action, parse_payload, validate_enqueue,
};
pub use autonomy::{Decision, apply_decision, decide};
pub use error::AgentError;
pub use navigation::next_location;

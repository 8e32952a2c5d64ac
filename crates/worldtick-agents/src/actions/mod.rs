//! Action validation and execution.
//!
//! # Submodules
//!
//! - [`validation`] -- Queue-time checks and loose-payload parsing.
//! - [`handlers`] -- Apply-time execution with denial outcomes.

pub mod handlers;
pub mod validation;

pub use handlers::{ActionOutcome, ApplyContext, CAPACITY_PENALTY_TICKS, apply_action};
pub use validation::{parse_payload, validate_enqueue};

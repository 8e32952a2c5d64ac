//! World state store, tick processor, and orchestration for the worldtick
//! simulation.
//!
//! Everything that mutates the world goes through [`WorldStore`], which
//! holds the state behind one lock. The modules below it work on
//! `&mut WorldState` and never lock themselves.
//!
//! # Modules
//!
//! - [`audit`] -- Bounded audit log of domain events.
//! - [`auto`] -- The autonomy step over all autonomous agents.
//! - [`config`] -- Configuration loading from `worldtick-config.yaml`.
//! - [`entry`] -- [`EntryVerifier`] trait, [`StubEntryVerifier`], and hash
//!   normalization for paid entry.
//! - [`error`] -- [`CoreError`].
//! - [`explain`] -- Human-readable lines from audit events.
//! - [`queue`] -- Validated FIFO action queueing.
//! - [`scenario`] -- Preset worlds.
//! - [`snapshot`] -- Snapshot documents and files.
//! - [`state`] -- [`WorldState`] and its views.
//! - [`store`] -- [`WorldStore`].
//! - [`tick`] -- The tick step.

pub mod audit;
pub mod auto;
pub mod config;
pub mod entry;
pub mod error;
pub mod explain;
pub mod queue;
pub mod scenario;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tick;

pub use auto::{AutoStepReport, AutoTickReport, MAX_LIMIT_AGENTS};
pub use config::{ConfigError, SimulationConfig};
pub use entry::{EntryError, EntryVerifier, StubEntryVerifier, VerifiedEntry};
pub use error::CoreError;
pub use scenario::Scenario;
pub use snapshot::SnapshotError;
pub use state::{Metrics, WorldSettings, WorldState, WorldView};
pub use store::{LoadReceipt, PersistenceStatus, SaveReceipt, WorldStore};
pub use tick::{MAX_STEPS, TickReport};

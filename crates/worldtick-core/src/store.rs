//! The world store: the single owner of the world state.
//!
//! Every public operation takes the lock once for its whole duration and
//! works on `&mut WorldState` through the lock-free helpers of the other
//! modules, so composite operations such as [`WorldStore::auto_tick`] never
//! re-enter the lock. Readers get clones and so only ever see whole states.
//!
//! A poisoned lock is recovered rather than propagated: the helpers leave
//! the state consistent between any two statements that can panic.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use worldtick_agents::{AgentError, agent, parse_payload};
use worldtick_types::{Action, ActionPayload, Agent, AgentId, EventKind, Goal, LogEvent};

use crate::auto::{self, AutoStepReport, AutoTickReport};
use crate::config::{PersistenceConfig, SimulationConfig};
use crate::entry::{EntryError, EntryVerifier, normalize_tx_hash};
use crate::error::CoreError;
use crate::explain;
use crate::queue;
use crate::scenario::Scenario;
use crate::snapshot::{self, LoadedSnapshot};
use crate::state::{Metrics, WorldSettings, WorldState, WorldView};
use crate::tick::{self, TickReport};

/// What a snapshot save wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    /// The file written.
    pub path: PathBuf,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// World tick at the save.
    pub tick: u64,
    /// Agents saved.
    pub agents: usize,
    /// Log events saved.
    pub logs: usize,
    /// Whether the log was included.
    pub include_logs: bool,
}

/// What a snapshot load read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReceipt {
    /// The file read, if the snapshot came from a file.
    pub path: Option<PathBuf>,
    /// When the snapshot was saved, if it says.
    pub saved_at: Option<DateTime<Utc>>,
    /// World tick after the load.
    pub tick: u64,
    /// Agents loaded.
    pub agents: usize,
    /// Log events after the load, including `persist_load`.
    pub logs: usize,
}

/// Where snapshots go and what the store last saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceStatus {
    /// The configured default snapshot path.
    pub default_path: PathBuf,
    /// The file the queried path resolves to.
    pub path: PathBuf,
    /// Whether that file exists.
    pub exists: bool,
    /// The last successful save, if any.
    pub last_saved: Option<SaveReceipt>,
    /// Current world counters.
    pub current: Metrics,
}

#[derive(Debug)]
struct StoreInner {
    state: WorldState,
    last_saved: Option<SaveReceipt>,
}

/// Shared, lock-protected access to one world.
#[derive(Debug)]
pub struct WorldStore {
    inner: Mutex<StoreInner>,
    settings: WorldSettings,
    allow_free_join: bool,
    default_limit_agents: usize,
    persistence: PersistenceConfig,
}

impl WorldStore {
    /// Create a store holding a fresh world shaped by `config`.
    pub fn new(config: &SimulationConfig) -> Self {
        let settings = config.world_settings();
        Self {
            inner: Mutex::new(StoreInner {
                state: WorldState::new(&settings),
                last_saved: None,
            }),
            settings,
            allow_free_join: config.entry.allow_free_join,
            default_limit_agents: config.autonomy.default_limit_agents,
            persistence: config.persistence.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The autonomy limit used when the caller gives none.
    pub const fn default_limit_agents(&self) -> usize {
        self.default_limit_agents
    }

    // -----------------------------------------------------------------------
    // Joining
    // -----------------------------------------------------------------------

    /// Add an agent without paid entry.
    ///
    /// # Errors
    ///
    /// - [`EntryError::PaymentRequired`] when free joins are disabled.
    /// - [`AgentError::InvalidName`] for an empty or over-long name.
    pub fn join(&self, name: &str, deposit_mon: u64) -> Result<Agent, CoreError> {
        if !self.allow_free_join {
            return Err(EntryError::PaymentRequired.into());
        }
        let mut inner = self.lock();
        Ok(add_agent(&mut inner.state, name, deposit_mon)?)
    }

    /// Add an agent whose entry is paid by `tx_hash`.
    ///
    /// The hash is checked against the replay set, verified with the lock
    /// released, and checked again before it is recorded. A hash is only
    /// recorded once the agent is created.
    ///
    /// # Errors
    ///
    /// - [`EntryError::InvalidTxHash`] for a malformed hash.
    /// - [`EntryError::ReplayedTx`] if the hash was already used.
    /// - Whatever the verifier returns, or [`EntryError::Rejected`] when it
    ///   reports a different transaction than the one asked about.
    /// - [`AgentError::InvalidName`] for an empty or over-long name.
    pub fn join_with_entry(
        &self,
        name: &str,
        deposit_mon: u64,
        tx_hash: &str,
        verifier: &impl EntryVerifier,
    ) -> Result<Agent, CoreError> {
        let tx_hash = normalize_tx_hash(tx_hash)?;
        agent::validate_name(name)?;
        if self.lock().state.entry.is_used(&tx_hash) {
            return Err(EntryError::ReplayedTx(tx_hash).into());
        }

        let verified = verifier.verify(&tx_hash)?;
        if !verified.tx_hash.trim().eq_ignore_ascii_case(&tx_hash) {
            return Err(EntryError::Rejected {
                message: format!("verifier answered for {}", verified.tx_hash),
            }
            .into());
        }

        let mut inner = self.lock();
        let state = &mut inner.state;
        if state.entry.is_used(&tx_hash) {
            return Err(EntryError::ReplayedTx(tx_hash).into());
        }
        let new_agent = add_agent(state, name, deposit_mon)?;
        state.entry.used_tx_hashes.insert(tx_hash.clone());
        state.log(
            EventKind::EntryVerified,
            json!({
                "agent_id": new_agent.id,
                "tx_hash": tx_hash,
                "from": verified.from,
                "value_wei": verified.value_wei.to_string(),
            }),
        );
        Ok(new_agent)
    }

    // -----------------------------------------------------------------------
    // Actions and ticks
    // -----------------------------------------------------------------------

    /// Validate and queue an action.
    ///
    /// # Errors
    ///
    /// Returns the queue-time [`AgentError`]; nothing is queued then.
    pub fn enqueue_action(
        &self,
        agent_id: AgentId,
        payload: ActionPayload,
    ) -> Result<Action, CoreError> {
        let mut inner = self.lock();
        Ok(queue::enqueue(&mut inner.state, agent_id, payload)?)
    }

    /// Queue an action given as a type tag and a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownActionType`] for an unknown tag,
    /// [`AgentError::InvalidPayload`] for a payload of the wrong shape, and
    /// otherwise as [`Self::enqueue_action`].
    pub fn enqueue_raw(
        &self,
        agent_id: AgentId,
        type_tag: &str,
        payload: &Value,
    ) -> Result<Action, CoreError> {
        let payload = parse_payload(type_tag, payload)?;
        self.enqueue_action(agent_id, payload)
    }

    /// Run `steps` tick steps.
    ///
    /// # Errors
    ///
    /// See [`tick::run_steps`].
    pub fn tick_step(&self, steps: u32) -> Result<TickReport, CoreError> {
        let mut inner = self.lock();
        tick::run_steps(&mut inner.state, steps)
    }

    /// Run the autonomy policy for up to `limit` agents, or the configured
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLimit`] for an out-of-range limit.
    pub fn auto_step(&self, limit: Option<usize>) -> Result<AutoStepReport, CoreError> {
        let limit = limit.unwrap_or(self.default_limit_agents);
        let mut inner = self.lock();
        auto::run_auto_step(&mut inner.state, limit)
    }

    /// Run an autonomy step and one tick step under a single lock.
    ///
    /// # Errors
    ///
    /// See [`auto::run_auto_tick`].
    pub fn auto_tick(&self, limit: Option<usize>) -> Result<AutoTickReport, CoreError> {
        let limit = limit.unwrap_or(self.default_limit_agents);
        let mut inner = self.lock();
        auto::run_auto_tick(&mut inner.state, limit)
    }

    // -----------------------------------------------------------------------
    // Reset and scenarios
    // -----------------------------------------------------------------------

    /// Replace the world with a fresh one, logging `reset`.
    ///
    /// With `preserve_replay_record` the used entry hashes survive.
    pub fn reset_world(&self, preserve_replay_record: bool) {
        let mut inner = self.lock();
        reset_state(&mut inner.state, &self.settings, preserve_replay_record);
    }

    /// Reset the world and load a named scenario.
    ///
    /// The replay record survives the reset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownScenario`] for an unknown name, in which
    /// case the world is untouched.
    pub fn load_scenario(&self, name: &str) -> Result<Metrics, CoreError> {
        let scenario =
            Scenario::from_name(name).ok_or_else(|| CoreError::UnknownScenario(name.to_owned()))?;
        let mut inner = self.lock();
        let state = &mut inner.state;
        reset_state(state, &self.settings, true);
        scenario.populate(state)?;
        Ok(state.metrics())
    }

    // -----------------------------------------------------------------------
    // Agent controls
    // -----------------------------------------------------------------------

    /// Turn the autonomy policy on for one agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn enable_auto(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        self.update_agent(agent_id, EventKind::AutoEnabled, |a| a.auto = true)
    }

    /// Turn the autonomy policy off for one agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn disable_auto(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        self.update_agent(agent_id, EventKind::AutoDisabled, |a| a.auto = false)
    }

    /// Turn autonomy on for every active agent and return how many.
    pub fn enable_auto_all(&self) -> usize {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let mut count: usize = 0;
        for current in state.agents.iter_mut().filter(|a| a.is_active()) {
            current.auto = true;
            count = count.saturating_add(1);
        }
        state.log(EventKind::AutoEnabledAll, json!({ "count": count }));
        count
    }

    /// Turn autonomy off for every agent that had it and return how many.
    pub fn disable_auto_all(&self) -> usize {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let mut count: usize = 0;
        for current in state.agents.iter_mut().filter(|a| a.auto) {
            current.auto = false;
            count = count.saturating_add(1);
        }
        state.log(EventKind::AutoDisabledAll, json!({ "count": count }));
        count
    }

    /// Set an agent's goal.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn set_goal(&self, agent_id: AgentId, goal: Goal) -> Result<Agent, CoreError> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let current = agent::require_mut(&mut state.agents, agent_id)?;
        current.goal = goal;
        let updated = current.clone();
        state.log(
            EventKind::GoalSet,
            json!({ "agent_id": agent_id, "goal": goal }),
        );
        Ok(updated)
    }

    fn update_agent(
        &self,
        agent_id: AgentId,
        event: EventKind,
        update: impl FnOnce(&mut Agent),
    ) -> Result<Agent, CoreError> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let current = agent::require_mut(&mut state.agents, agent_id)?;
        update(current);
        let updated = current.clone();
        state.log(event, json!({ "agent_id": agent_id }));
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Encode the world as a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`](crate::snapshot::SnapshotError::Json)
    /// if encoding fails.
    pub fn save_snapshot(&self, include_logs: bool) -> Result<Value, CoreError> {
        let inner = self.lock();
        Ok(snapshot::to_document(&inner.state, include_logs, Utc::now())?)
    }

    /// Replace the world with a snapshot document, logging `persist_load`.
    ///
    /// # Errors
    ///
    /// See [`snapshot::from_document`]. The world is untouched on error.
    pub fn load_snapshot(&self, document: &Value) -> Result<LoadReceipt, CoreError> {
        let loaded = snapshot::from_document(document, &self.settings)?;
        let mut inner = self.lock();
        Ok(install(&mut inner.state, loaded, None))
    }

    /// Save the world to `path`, or the configured snapshot path.
    ///
    /// The write happens under the lock; `persist_save` is logged after it,
    /// so the saved file does not contain its own save event.
    ///
    /// # Errors
    ///
    /// Returns the [`SnapshotError`](crate::snapshot::SnapshotError) from
    /// encoding or writing.
    pub fn save_to_path(
        &self,
        path: Option<&Path>,
        include_logs: Option<bool>,
    ) -> Result<SaveReceipt, CoreError> {
        let path = path.unwrap_or(&self.persistence.snapshot_path);
        let include_logs = include_logs.unwrap_or(self.persistence.include_logs);

        let mut inner = self.lock();
        let saved_at = Utc::now();
        let document = snapshot::to_document(&inner.state, include_logs, saved_at)?;
        let written = snapshot::write_file(path, &document)?;

        let state = &mut inner.state;
        let receipt = SaveReceipt {
            path: written,
            saved_at,
            tick: state.tick,
            agents: state.agents.len(),
            logs: if include_logs { state.logs.len() } else { 0 },
            include_logs,
        };
        state.log(
            EventKind::PersistSave,
            json!({
                "path": receipt.path.display().to_string(),
                "include_logs": include_logs,
            }),
        );
        info!(path = %receipt.path.display(), tick = receipt.tick, "snapshot saved");
        inner.last_saved = Some(receipt.clone());
        Ok(receipt)
    }

    /// Load the world from `path`, or the configured snapshot path.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`](crate::snapshot::SnapshotError::NotFound)
    /// for a missing file, and otherwise as [`Self::load_snapshot`].
    pub fn load_from_path(&self, path: Option<&Path>) -> Result<LoadReceipt, CoreError> {
        let path = path.unwrap_or(&self.persistence.snapshot_path);
        let (read, text) = snapshot::read_file(path)?;
        let loaded = snapshot::from_json(&text, &self.settings)?;
        let mut inner = self.lock();
        Ok(install(&mut inner.state, loaded, Some(read)))
    }

    /// Where `path` (or the configured path) resolves, whether a snapshot is
    /// there, and what was saved last.
    pub fn persistence_status(&self, path: Option<&Path>) -> PersistenceStatus {
        let default_path = self.persistence.snapshot_path.clone();
        let path = snapshot::resolve_path(path.unwrap_or(&default_path));
        let exists = path.is_file();
        let inner = self.lock();
        PersistenceStatus {
            default_path,
            path,
            exists,
            last_saved: inner.last_saved.clone(),
            current: inner.state.metrics(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Explain the last `limit` events, oldest first.
    pub fn explain_recent(&self, limit: usize) -> Vec<String> {
        let inner = self.lock();
        explain::format_events(&inner.state.logs.recent(limit))
    }

    /// Explain the last `limit` events about one agent, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the agent does not exist.
    pub fn explain_agent(&self, agent_id: AgentId, limit: usize) -> Result<Vec<String>, CoreError> {
        let inner = self.lock();
        agent::require(&inner.state.agents, agent_id)?;
        Ok(explain::format_events(
            &inner.state.logs.for_agent(agent_id, limit),
        ))
    }

    /// Summary counters.
    pub fn metrics(&self) -> Metrics {
        self.lock().state.metrics()
    }

    /// The world as shown to observers.
    pub fn world(&self) -> WorldView {
        self.lock().state.view()
    }

    /// One agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn agent(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        let inner = self.lock();
        Ok(agent::require(&inner.state.agents, agent_id)?.clone())
    }

    /// The last `limit` log events, oldest first.
    pub fn recent_logs(&self, limit: usize) -> Vec<LogEvent> {
        self.lock().state.logs.recent(limit)
    }

    /// A deep copy of the whole world.
    pub fn state(&self) -> WorldState {
        self.lock().state.clone()
    }
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

fn add_agent(state: &mut WorldState, name: &str, deposit_mon: u64) -> Result<Agent, AgentError> {
    let new_agent = agent::create_agent(&state.agents, name, deposit_mon)?;
    state.log(
        EventKind::Join,
        json!({
            "agent_id": new_agent.id,
            "name": new_agent.name,
            "deposit_mon": deposit_mon,
        }),
    );
    info!(agent_id = %new_agent.id, name = %new_agent.name, deposit_mon, "agent joined");
    state.agents.push(new_agent.clone());
    Ok(new_agent)
}

fn reset_state(state: &mut WorldState, settings: &WorldSettings, preserve_replay_record: bool) {
    let entry = std::mem::take(&mut state.entry);
    *state = WorldState::new(settings);
    if preserve_replay_record {
        state.entry = entry;
    }
    state.log(
        EventKind::Reset,
        json!({ "preserve_replay_record": preserve_replay_record }),
    );
    info!(preserve_replay_record, "world reset");
}

fn install(state: &mut WorldState, loaded: LoadedSnapshot, path: Option<PathBuf>) -> LoadReceipt {
    *state = loaded.state;
    state.log(
        EventKind::PersistLoad,
        json!({
            "path": path.as_ref().map(|p| p.display().to_string()),
            "saved_at": loaded.saved_at,
        }),
    );
    debug!(tick = state.tick, agents = state.agents.len(), "snapshot installed");
    info!(path = ?path, tick = state.tick, "snapshot loaded");
    LoadReceipt {
        path,
        saved_at: loaded.saved_at,
        tick: state.tick,
        agents: state.agents.len(),
        logs: state.logs.len(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use crate::entry::StubEntryVerifier;
    use crate::snapshot::SnapshotError;

    use super::*;

    fn tx(n: u8) -> String {
        format!("0x{}", format!("{n:02x}").repeat(32))
    }

    struct RefusingVerifier;

    impl EntryVerifier for RefusingVerifier {
        fn verify(&self, _tx_hash: &str) -> Result<crate::entry::VerifiedEntry, EntryError> {
            Err(EntryError::Rejected {
                message: "wrong recipient".to_owned(),
            })
        }
    }

    struct MismatchedVerifier;

    impl EntryVerifier for MismatchedVerifier {
        fn verify(&self, _tx_hash: &str) -> Result<crate::entry::VerifiedEntry, EntryError> {
            Ok(crate::entry::VerifiedEntry {
                tx_hash: tx(0xee),
                from: "0xabc".to_owned(),
                value_wei: 1,
            })
        }
    }

    #[test]
    fn join_assigns_increasing_ids() {
        let store = WorldStore::default();
        assert_eq!(store.join("alice", 10).unwrap().id, AgentId(1));
        assert_eq!(store.join("bob", 2).unwrap().id, AgentId(2));
        assert_eq!(store.metrics().agents, 2);
    }

    #[test]
    fn blank_names_are_refused() {
        let store = WorldStore::default();
        let err = store.join("   ", 1).unwrap_err();
        assert!(matches!(err, CoreError::Agent(AgentError::InvalidName { .. })));
        assert!(store.recent_logs(10).is_empty());
    }

    #[test]
    fn paid_join_records_the_hash_once() {
        let store = WorldStore::default();
        let verifier = StubEntryVerifier::new(1);
        let joined = store.join_with_entry("alice", 5, &tx(1), &verifier).unwrap();
        assert_eq!(joined.balance_mon, 5);

        let err = store
            .join_with_entry("mallory", 5, &tx(1).to_uppercase().replace("0X", "0x"), &verifier)
            .unwrap_err();
        assert!(matches!(err, CoreError::Entry(EntryError::ReplayedTx(_))));
        assert_eq!(store.metrics().agents, 1);

        let kinds: Vec<EventKind> = store.recent_logs(10).iter().map(|e| e.event).collect();
        assert_eq!(kinds, vec![EventKind::Join, EventKind::EntryVerified]);
    }

    #[test]
    fn refused_entries_are_not_recorded() {
        let store = WorldStore::default();
        let err = store
            .join_with_entry("alice", 5, &tx(2), &RefusingVerifier)
            .unwrap_err();
        assert!(err.is_domain_rejection());
        assert!(store.state().entry.used_tx_hashes.is_empty());
        assert!(store.join_with_entry("alice", 5, &tx(2), &StubEntryVerifier::default()).is_ok());
    }

    #[test]
    fn verification_of_another_transaction_is_refused() {
        let store = WorldStore::default();
        let err = store
            .join_with_entry("alice", 5, &tx(6), &MismatchedVerifier)
            .unwrap_err();
        assert!(matches!(err, CoreError::Entry(EntryError::Rejected { .. })));
        assert_eq!(store.metrics().agents, 0);
        assert!(store.state().entry.used_tx_hashes.is_empty());

        let upper = tx(6).to_ascii_uppercase().replacen("0X", "0x", 1);
        assert!(store.join_with_entry("alice", 5, &upper, &StubEntryVerifier::default()).is_ok());
    }

    #[test]
    fn free_join_can_be_disabled() {
        let mut config = SimulationConfig::default();
        config.entry.allow_free_join = false;
        let store = WorldStore::new(&config);
        let err = store.join("alice", 1).unwrap_err();
        assert!(matches!(err, CoreError::Entry(EntryError::PaymentRequired)));
        assert!(store.join_with_entry("alice", 1, &tx(3), &StubEntryVerifier::default()).is_ok());
    }

    #[test]
    fn raw_actions_are_parsed_then_queued() {
        let store = WorldStore::default();
        let alice = store.join("alice", 1).unwrap();
        let action = store
            .enqueue_raw(alice.id, "move", &json!({ "to": "market" }))
            .unwrap();
        assert_eq!(action.payload, ActionPayload::move_to("market"));

        let err = store.enqueue_raw(alice.id, "dance", &json!({})).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Agent(AgentError::UnknownActionType(ref tag)) if tag == "dance"
        ));

        let err = store
            .enqueue_raw(alice.id, "move", &json!({ "to": 7 }))
            .unwrap_err();
        assert!(matches!(err, CoreError::Agent(AgentError::InvalidPayload { .. })));
        assert_eq!(store.metrics().queued_actions, 1);
    }

    #[test]
    fn reset_keeps_replay_record_on_request() {
        let store = WorldStore::default();
        store
            .join_with_entry("alice", 1, &tx(4), &StubEntryVerifier::default())
            .unwrap();

        store.reset_world(true);
        assert_eq!(store.metrics().agents, 0);
        assert!(store.state().entry.is_used(&tx(4)));

        store.reset_world(false);
        assert!(store.state().entry.used_tx_hashes.is_empty());
        let logs = store.recent_logs(10);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, EventKind::Reset);
    }

    #[test]
    fn unknown_scenarios_leave_the_world_alone() {
        let store = WorldStore::default();
        store.join("alice", 1).unwrap();
        let err = store.load_scenario("chaos").unwrap_err();
        assert!(matches!(err, CoreError::UnknownScenario(_)));
        assert_eq!(store.metrics().agents, 1);
    }

    #[test]
    fn auto_toggles_count_and_log() {
        let store = WorldStore::default();
        store.load_scenario("basic").unwrap();

        assert!(store.enable_auto(AgentId(2)).unwrap().auto);
        assert_eq!(store.disable_auto_all(), 1);
        assert_eq!(store.enable_auto_all(), 3);
        assert!(!store.disable_auto(AgentId(1)).unwrap().auto);
        assert_eq!(store.set_goal(AgentId(3), Goal::Idle).unwrap().goal, Goal::Idle);
        assert!(matches!(
            store.enable_auto(AgentId(9)).unwrap_err(),
            CoreError::Agent(AgentError::AgentNotFound(AgentId(9)))
        ));

        let kinds: Vec<EventKind> = store.recent_logs(5).iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::AutoEnabled,
                EventKind::AutoDisabledAll,
                EventKind::AutoEnabledAll,
                EventKind::AutoDisabled,
                EventKind::GoalSet,
            ]
        );
    }

    #[test]
    fn auto_step_uses_the_configured_default_limit() {
        let mut config = SimulationConfig::default();
        config.autonomy.default_limit_agents = 1;
        let store = WorldStore::new(&config);
        store.load_scenario("basic_auto").unwrap();

        let report = store.auto_step(None).unwrap();
        assert_eq!(report.generated_actions.len(), 1);
        assert!(matches!(
            store.auto_step(Some(0)).unwrap_err(),
            CoreError::InvalidLimit { limit: 0, .. }
        ));
    }

    #[test]
    fn document_snapshots_replace_the_world() {
        let source = WorldStore::default();
        source.load_scenario("basic").unwrap();
        source.tick_step(2).unwrap();
        let document = source.save_snapshot(true).unwrap();

        let target = WorldStore::default();
        let receipt = target.load_snapshot(&document).unwrap();
        assert_eq!(receipt.tick, 2);
        assert_eq!(receipt.agents, 3);
        assert_eq!(receipt.path, None);
        assert_eq!(target.world().agents, source.world().agents);
        assert_eq!(
            target.recent_logs(1)[0].event,
            EventKind::PersistLoad
        );
    }

    #[test]
    fn bad_documents_leave_the_world_alone() {
        let store = WorldStore::default();
        store.join("alice", 1).unwrap();
        let err = store
            .load_snapshot(&json!({ "schema_version": 2, "world_state": {} }))
            .unwrap_err();
        assert!(matches!(err, CoreError::Snapshot(SnapshotError::UnsupportedSchema(_))));
        assert_eq!(store.metrics().agents, 1);
    }

    #[test]
    fn file_snapshots_report_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorldStore::default();
        store.load_scenario("basic").unwrap();

        let before = store.persistence_status(Some(dir.path()));
        assert!(!before.exists);
        assert_eq!(before.last_saved, None);

        let receipt = store.save_to_path(Some(dir.path()), Some(false)).unwrap();
        assert_eq!(receipt.path, dir.path().join(snapshot::DEFAULT_SNAPSHOT_FILE));
        assert_eq!(receipt.logs, 0);

        let after = store.persistence_status(Some(dir.path()));
        assert!(after.exists);
        assert_eq!(after.last_saved, Some(receipt));
        assert_eq!(store.recent_logs(1)[0].event, EventKind::PersistSave);
    }

    #[test]
    fn missing_snapshot_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorldStore::default();
        let err = store
            .load_from_path(Some(&dir.path().join("absent.json")))
            .unwrap_err();
        assert!(matches!(err, CoreError::Snapshot(SnapshotError::NotFound(_))));
    }

    #[test]
    fn explain_agent_requires_the_agent() {
        let store = WorldStore::default();
        store.load_scenario("basic").unwrap();
        let lines = store.explain_agent(AgentId(2), 10).unwrap();
        assert_eq!(lines, vec!["tick 0: agent 2 joined as 'bob', deposit=2"]);
        assert!(store.explain_agent(AgentId(7), 10).is_err());
    }
}

//! Snapshot documents and their file storage.
//!
//! A snapshot is a JSON document:
//!
//! ```json
//! { "schema_version": 1, "saved_at": "...", "world_state": { ... } }
//! ```
//!
//! Saving writes the typed state directly. Loading is lenient: snapshots
//! can come from older versions or be edited by hand, so every field is read
//! through a normalization pass that substitutes safe defaults instead of
//! failing. Only three things are fatal: text that is not JSON, a schema
//! version other than 1, and a `world_state` that is not an object.
//!
//! Queued payload values that cannot be read are kept as sentinels (amount
//! 0, agent id 0, empty location) so that the tick processor denies them in
//! the audit log rather than having them silently disappear. Agents without
//! a usable id and actions of an unknown type cannot be represented at all
//! and are dropped with a warning.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::warn;
use worldtick_ledger::clamp_capacity;
use worldtick_types::{
    Action, ActionPayload, ActionType, Agent, AgentId, AgentStatus, DenialReason, Economy,
    EntryRegistry, EventKind, Goal, LogEvent, PendingReaction, SPAWN_LOCATION,
};

use crate::audit::AuditLog;
use crate::entry::normalize_tx_hash;
use crate::state::{WorldSettings, WorldState};

/// The only snapshot schema version understood.
pub const SCHEMA_VERSION: u64 = 1;

/// File name used when a snapshot path names a directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "world_snapshot.json";

/// Errors from saving or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON, or the state could not be encoded.
    #[error("snapshot JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The document declares a schema version other than 1.
    #[error("unsupported snapshot schema_version: {0}")]
    UnsupportedSchema(String),

    /// The document does not have the expected shape.
    #[error("snapshot document is invalid: {0}")]
    InvalidDocument(String),

    /// No snapshot file exists at the path.
    #[error("snapshot not found: {}", .0.display())]
    NotFound(PathBuf),
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    schema_version: u64,
    saved_at: DateTime<Utc>,
    world_state: WorldStateRecord<'a>,
}

#[derive(Serialize)]
struct WorldStateRecord<'a> {
    tick: u64,
    locations: &'a [String],
    agents: &'a [Agent],
    action_queue: &'a [Action],
    logs: Vec<&'a LogEvent>,
    economy: &'a Economy,
    entry: &'a EntryRegistry,
}

/// Encode the world as a snapshot document.
///
/// With `include_logs == false` the document carries an empty log.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if encoding fails.
pub fn to_document(
    state: &WorldState,
    include_logs: bool,
    saved_at: DateTime<Utc>,
) -> Result<Value, SnapshotError> {
    let logs = if include_logs {
        state.logs.iter().collect()
    } else {
        Vec::new()
    };
    let record = SnapshotRecord {
        schema_version: SCHEMA_VERSION,
        saved_at,
        world_state: WorldStateRecord {
            tick: state.tick,
            locations: &state.locations,
            agents: &state.agents,
            action_queue: &state.action_queue,
            logs,
            economy: &state.economy,
            entry: &state.entry,
        },
    };
    Ok(serde_json::to_value(record)?)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A snapshot document read back into a world.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    /// The normalized world.
    pub state: WorldState,
    /// When the snapshot was saved, if the document says so.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Parse snapshot text.
///
/// # Errors
///
/// See [`from_document`]; additionally [`SnapshotError::Json`] for text
/// that is not JSON.
pub fn from_json(text: &str, settings: &WorldSettings) -> Result<LoadedSnapshot, SnapshotError> {
    let document: Value = serde_json::from_str(text)?;
    from_document(&document, settings)
}

/// Read a snapshot document into a normalized world.
///
/// Settings supply the defaults for locations, log capacity, and workshop
/// capacity when the document lacks usable values.
///
/// # Errors
///
/// - [`SnapshotError::UnsupportedSchema`] unless `schema_version` is 1.
/// - [`SnapshotError::InvalidDocument`] if the document or its
///   `world_state` is not an object.
pub fn from_document(
    document: &Value,
    settings: &WorldSettings,
) -> Result<LoadedSnapshot, SnapshotError> {
    let Some(root) = document.as_object() else {
        return Err(SnapshotError::InvalidDocument(
            "document is not an object".to_owned(),
        ));
    };

    let version = root.get("schema_version").unwrap_or(&Value::Null);
    if lenient_u64(version) != Some(SCHEMA_VERSION) {
        return Err(SnapshotError::UnsupportedSchema(version.to_string()));
    }

    let Some(world) = root.get("world_state").and_then(Value::as_object) else {
        return Err(SnapshotError::InvalidDocument(
            "world_state is not an object".to_owned(),
        ));
    };

    Ok(LoadedSnapshot {
        state: normalize_world(world, settings),
        saved_at: root.get("saved_at").and_then(lenient_time),
    })
}

fn normalize_world(world: &Map<String, Value>, settings: &WorldSettings) -> WorldState {
    let mut state = WorldState::new(settings);

    state.tick = world.get("tick").and_then(lenient_u64).unwrap_or(0);

    if let Some(locations) = world.get("locations").and_then(normalize_locations) {
        state.locations = locations;
    }

    let mut seen = BTreeSet::new();
    for raw in array(world.get("agents")) {
        let Some(agent) = normalize_agent(raw, &state.locations) else {
            warn!(agent = %raw, "dropping snapshot agent without a valid id");
            continue;
        };
        if !seen.insert(agent.id) {
            warn!(agent_id = %agent.id, "dropping snapshot agent with duplicate id");
            continue;
        }
        state.agents.push(agent);
    }

    for raw in array(world.get("action_queue")) {
        match normalize_action(raw) {
            Some(action) => state.action_queue.push(action),
            None => warn!(action = %raw, "dropping snapshot action of unknown type"),
        }
    }

    let mut logs = AuditLog::new(settings.max_logs);
    for raw in array(world.get("logs")) {
        if let Some(event) = normalize_log(raw) {
            logs.push(event);
        }
    }
    state.logs = logs;

    state.economy = normalize_economy(world.get("economy"), settings.capacity_per_tick);
    state.entry = normalize_entry(world.get("entry"));

    state
}

fn normalize_locations(raw: &Value) -> Option<Vec<String>> {
    let mut locations: Vec<String> = Vec::new();
    for name in raw.as_array()?.iter().filter_map(Value::as_str) {
        let name = name.trim();
        if !name.is_empty() && !locations.iter().any(|l| l == name) {
            locations.push(name.to_owned());
        }
    }
    (!locations.is_empty()).then_some(locations)
}

fn normalize_agent(raw: &Value, locations: &[String]) -> Option<Agent> {
    let fields = raw.as_object()?;
    let id = AgentId(fields.get("id").and_then(lenient_u64)?);
    if !id.is_valid() {
        return None;
    }

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| format!("agent-{id}"), str::to_owned);
    let mut agent = Agent::new(id, name, 0);

    agent.balance_mon = fields.get("balance_mon").and_then(lenient_u64).unwrap_or(0);
    agent.pos = normalize_pos(fields.get("pos"), locations);
    agent.status = match fields.get("status") {
        None | Some(Value::Null) => AgentStatus::Active,
        Some(Value::String(s)) => AgentStatus::from_tag(s),
        Some(_) => AgentStatus::Inactive,
    };
    agent.inventory = array(fields.get("inventory"))
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect();
    agent.auto = fields.get("auto").and_then(Value::as_bool).unwrap_or(false);
    agent.goal = fields
        .get("goal")
        .and_then(Value::as_str)
        .map_or(Goal::Earn, Goal::from_tag_or_default);
    agent.cooldown_until_tick = fields
        .get("cooldown_until_tick")
        .and_then(lenient_u64)
        .unwrap_or(0);
    agent.pending_reaction = normalize_reaction(fields);

    Some(agent)
}

fn normalize_pos(raw: Option<&Value>, locations: &[String]) -> String {
    let known = raw
        .and_then(Value::as_str)
        .filter(|pos| locations.iter().any(|l| l == pos));
    if let Some(pos) = known {
        return pos.to_owned();
    }
    if locations.iter().any(|l| l == SPAWN_LOCATION) {
        return SPAWN_LOCATION.to_owned();
    }
    locations
        .first()
        .map_or_else(|| SPAWN_LOCATION.to_owned(), Clone::clone)
}

/// Current shape first, then the flat `last_denied_reason` /
/// `last_denied_tick` pair older snapshots carry.
fn normalize_reaction(fields: &Map<String, Value>) -> Option<PendingReaction> {
    let (reason, tick) = match fields.get("pending_reaction").and_then(Value::as_object) {
        Some(pending) => (pending.get("reason"), pending.get("denied_at_tick")),
        None => (
            fields.get("last_denied_reason"),
            fields.get("last_denied_tick"),
        ),
    };
    if reason.and_then(Value::as_str) != Some(DenialReason::Capacity.as_str()) {
        return None;
    }
    Some(PendingReaction {
        reason: DenialReason::Capacity,
        denied_at_tick: tick.and_then(lenient_u64)?,
    })
}

fn normalize_action(raw: &Value) -> Option<Action> {
    let fields = raw.as_object()?;
    let action_type = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(ActionType::from_tag)?;
    let empty = Map::new();
    let payload = fields
        .get("payload")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let amount = || match payload.get("amount") {
        None if action_type == ActionType::Earn => 1,
        value => value.and_then(lenient_i64).unwrap_or(0),
    };
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    let payload = match action_type {
        ActionType::Move => ActionPayload::Move { to: text("to") },
        ActionType::Earn => ActionPayload::Earn { amount: amount() },
        ActionType::Say => ActionPayload::Say { text: text("text") },
        ActionType::Transfer => ActionPayload::Transfer {
            to_agent_id: AgentId(payload.get("to_agent_id").and_then(lenient_u64).unwrap_or(0)),
            amount: amount(),
        },
    };

    Some(Action {
        queued_at_tick: fields.get("queued_at_tick").and_then(lenient_u64).unwrap_or(0),
        agent_id: AgentId(fields.get("agent_id").and_then(lenient_u64).unwrap_or(0)),
        payload,
    })
}

fn normalize_log(raw: &Value) -> Option<LogEvent> {
    let fields = raw.as_object()?;
    let time = fields
        .get("time")
        .and_then(lenient_time)
        .unwrap_or(DateTime::UNIX_EPOCH);
    let tick = fields.get("tick").and_then(lenient_u64).unwrap_or(0);
    let data = fields.get("data").cloned().unwrap_or_else(|| json!({}));
    Some(match fields.get("event").and_then(Value::as_str) {
        Some(tag) => LogEvent::with_tag(time, tick, tag, data),
        None => LogEvent::new(time, tick, EventKind::Other, data),
    })
}

fn normalize_economy(raw: Option<&Value>, default_per_tick: u32) -> Economy {
    let fields = raw.and_then(Value::as_object);
    let read = |key: &str| {
        fields
            .and_then(|f| f.get(key))
            .and_then(lenient_u64)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
    };
    let per_tick = read("workshop_capacity_per_tick").unwrap_or(default_per_tick);
    let mut economy = Economy {
        capacity_per_tick: per_tick,
        capacity_left: read("workshop_capacity_left").unwrap_or(per_tick),
    };
    clamp_capacity(&mut economy);
    economy
}

fn normalize_entry(raw: Option<&Value>) -> EntryRegistry {
    let hashes = raw
        .and_then(|e| e.get("used_tx_hashes"))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .filter_map(|h| normalize_tx_hash(h).ok())
                .collect()
        })
        .unwrap_or_default();
    EntryRegistry {
        used_tx_hashes: hashes,
    }
}

fn array(raw: Option<&Value>) -> impl Iterator<Item = &Value> {
    raw.and_then(Value::as_array).into_iter().flatten()
}

/// A non-negative integer, or a string holding one.
fn lenient_u64(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An integer, or a string holding one.
fn lenient_i64(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An RFC 3339 timestamp, or seconds since the epoch (integer or float).
#[allow(clippy::cast_possible_truncation)]
fn lenient_time(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return DateTime::from_timestamp(secs, 0);
            }
            let secs = n.as_f64()?;
            let millis = (secs * 1000.0).round();
            if !millis.is_finite() || millis.abs() > 8.0e15 {
                return None;
            }
            DateTime::from_timestamp_millis(millis as i64)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// The file a snapshot path refers to: a directory gets
/// [`DEFAULT_SNAPSHOT_FILE`] appended.
pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_SNAPSHOT_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Write a document to `path` atomically and return the file written.
///
/// The document goes to `<path>.tmp` first and is renamed over `path`.
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] or [`SnapshotError::Json`].
pub fn write_file(path: &Path, document: &Value) -> Result<PathBuf, SnapshotError> {
    let path = resolve_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let bytes = serde_json::to_vec_pretty(document)?;
    std::fs::write(&tmp, bytes).map_err(|source| SnapshotError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, &path).map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Read the text of the snapshot at `path`, returning the file read too.
///
/// # Errors
///
/// Returns [`SnapshotError::NotFound`] if the file does not exist, or
/// [`SnapshotError::Io`] if it cannot be read.
pub fn read_file(path: &Path) -> Result<(PathBuf, String), SnapshotError> {
    let path = resolve_path(path);
    if !path.exists() {
        return Err(SnapshotError::NotFound(path));
    }
    let text = std::fs::read_to_string(&path).map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;
    Ok((path, text))
}

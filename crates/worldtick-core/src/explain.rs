//! Human-readable rendering of audit events.
//!
//! [`format_event`] is pure: it reads only the event itself, so the same log
//! always explains the same way, including logs loaded from snapshots.
//! Fields missing from an event's data render as `?`.

use serde_json::Value;
use worldtick_types::{EventKind, LogEvent};

/// Render one event as a single line.
pub fn format_event(event: &LogEvent) -> String {
    let t = event.tick;
    let d = &event.data;
    let agent = field(d, "agent_id");

    match event.event {
        EventKind::Join => format!(
            "tick {t}: agent {agent} joined as '{}', deposit={}",
            field(d, "name"),
            field(d, "deposit_mon")
        ),
        EventKind::EntryVerified => format!(
            "tick {t}: entry tx {} verified for agent {agent}",
            field(d, "tx_hash")
        ),
        EventKind::QueuedAction => format!(
            "tick {t}: queued {} by agent {agent} payload={}",
            field(d, "type"),
            field(d, "payload")
        ),
        EventKind::Tick => format!(
            "tick {t}: tick step applied_actions={}",
            field(d, "applied_actions")
        ),
        EventKind::Move => format!("tick {t}: agent {agent} moved to {}", field(d, "to")),
        EventKind::MoveCost => format!(
            "tick {t}: agent {agent} paid {} for move (balance={})",
            field(d, "cost"),
            field(d, "balance_mon")
        ),
        EventKind::MoveDeniedInvalidPayload => format!(
            "tick {t}: move denied for agent {agent} (invalid payload {})",
            field(d, "payload")
        ),
        EventKind::MoveDeniedInsufficientFunds => format!(
            "tick {t}: move denied for agent {agent} (balance={}, cost={})",
            field(d, "balance_mon"),
            field(d, "cost")
        ),
        EventKind::Earn => format!(
            "tick {t}: agent {agent} earned {} (balance={})",
            field(d, "amount"),
            field(d, "balance_mon")
        ),
        EventKind::EarnDeniedWrongLocation => format!(
            "tick {t}: earn denied for agent {agent} (pos={})",
            field(d, "pos")
        ),
        EventKind::EarnDeniedCapacity => format!(
            "tick {t}: earn denied for agent {agent} (workshop capacity exhausted)"
        ),
        EventKind::EarnDeniedInvalidAmount => format!(
            "tick {t}: earn denied for agent {agent} (invalid amount {})",
            field(d, "amount")
        ),
        EventKind::CooldownPenalty => format!(
            "tick {t}: cooldown penalty for agent {agent} until tick {} ({})",
            field(d, "cooldown_until_tick"),
            field(d, "reason")
        ),
        EventKind::Say => format!(
            "tick {t}: agent {agent} said '{}' at {}",
            field(d, "text"),
            field(d, "pos")
        ),
        EventKind::Transfer => format!(
            "tick {t}: agent {agent} transferred {} to agent {} (balance={})",
            field(d, "amount"),
            field(d, "to_agent_id"),
            field(d, "balance_mon")
        ),
        EventKind::TransferDeniedUnknownTarget => format!(
            "tick {t}: transfer denied for agent {agent} (unknown target {})",
            field(d, "to_agent_id")
        ),
        EventKind::TransferDeniedSelf => {
            format!("tick {t}: transfer denied for agent {agent} (cannot pay self)")
        }
        EventKind::TransferDeniedInvalidAmount => format!(
            "tick {t}: transfer denied for agent {agent} (invalid amount {})",
            field(d, "amount")
        ),
        EventKind::TransferDeniedInsufficientFunds => format!(
            "tick {t}: transfer denied for agent {agent} (balance={}, amount={})",
            field(d, "balance_mon"),
            field(d, "amount")
        ),
        EventKind::TransferDeniedBalanceOverflow => format!(
            "tick {t}: transfer denied for agent {agent} (receiver {} balance would overflow)",
            field(d, "to_agent_id")
        ),
        EventKind::ActionSkippedUnknownAgent => format!(
            "tick {t}: skipped action for unknown agent action={}",
            field(d, "action")
        ),
        EventKind::AutoDecision => format!(
            "tick {t}: auto decision agent={agent} goal={} reason={} chosen={}",
            field(d, "goal"),
            field(d, "reason"),
            chosen(d.get("chosen"))
        ),
        EventKind::AutoEnabled => format!("tick {t}: auto enabled for agent {agent}"),
        EventKind::AutoDisabled => format!("tick {t}: auto disabled for agent {agent}"),
        EventKind::AutoEnabledAll => format!(
            "tick {t}: auto enabled for all active agents (count={})",
            field(d, "count")
        ),
        EventKind::AutoDisabledAll => format!(
            "tick {t}: auto disabled for agents (count={})",
            field(d, "count")
        ),
        EventKind::GoalSet => format!(
            "tick {t}: goal set for agent {agent} -> {}",
            field(d, "goal")
        ),
        EventKind::Reset => format!("tick {t}: world reset"),
        EventKind::ScenarioLoaded => format!(
            "tick {t}: scenario loaded: {} (agents={})",
            field(d, "name"),
            field(d, "agents")
        ),
        EventKind::PersistSave => format!(
            "tick {t}: snapshot saved to {} (include_logs={})",
            field(d, "path"),
            field(d, "include_logs")
        ),
        EventKind::PersistLoad => match d.get("path").and_then(Value::as_str) {
            Some(path) => format!("tick {t}: snapshot loaded from {path}"),
            None => format!("tick {t}: snapshot loaded from document"),
        },
        EventKind::Other => format!("tick {t}: {} {d}", event.tag()),
    }
}

/// Render every event in order.
pub fn format_events<'a>(events: impl IntoIterator<Item = &'a LogEvent>) -> Vec<String> {
    events.into_iter().map(format_event).collect()
}

/// A data field as text: strings bare, everything else as JSON.
fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        None | Some(Value::Null) => "?".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn chosen(action: Option<&Value>) -> String {
    match action {
        Some(Value::Object(a)) => format!(
            "{} {}",
            a.get("type").and_then(Value::as_str).unwrap_or("?"),
            a.get("payload").unwrap_or(&Value::Null)
        ),
        _ => "none".to_owned(),
    }
}

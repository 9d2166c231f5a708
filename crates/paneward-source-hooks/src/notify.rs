//! Lifecycle notification entry point.
//!
//! Invoked by the monitored program's hook configuration as
//! `paneward hook <event>` with a JSON payload on stdin. Every failure mode
//! (no pane context, unknown event, malformed payload) is a silent no-op:
//! a hook must never break the program that called it.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::StoreError;
use crate::store::{
    EventRecord, EventStore, STATUS_IDLE, STATUS_PAUSED, STATUS_STOPPED, STATUS_WORKING,
    WriteOutcome,
};

/// Program hook name -> event token accepted by [`map_event_to_status`].
pub const HOOK_EVENTS: &[(&str, &str)] = &[
    ("UserPromptSubmit", "prompt-submit"),
    ("Stop", "stop"),
    ("Notification", "notification"),
    ("PermissionRequest", "permission-request"),
    ("PostToolUse", "post-tool-use"),
    ("SessionEnd", "session-end"),
];

/// The subset of the hook payload that matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HookPayload {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub notification_type: Option<String>,
}

impl HookPayload {
    /// Best-effort parse; malformed or empty input yields the default.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        serde_json::from_slice(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "ignoring malformed hook payload");
            Self::default()
        })
    }
}

/// Map an event token to the event-store status vocabulary.
///
/// Only `elicitation_dialog` notifications mean the program is waiting on a
/// question; permission prompts already arrive as `permission-request`, and
/// a late permission notification would otherwise race `stop` back to paused.
pub fn map_event_to_status(event: &str, notification_type: Option<&str>) -> Option<&'static str> {
    match event {
        "prompt-submit" | "post-tool-use" => Some(STATUS_WORKING),
        "stop" => Some(STATUS_IDLE),
        "notification" if notification_type == Some("elicitation_dialog") => Some(STATUS_PAUSED),
        "notification" => Some(STATUS_IDLE),
        "permission-request" => Some(STATUS_PAUSED),
        "session-end" => Some(STATUS_STOPPED),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// No pane context or unrecognized event.
    Ignored,
    Recorded(WriteOutcome),
}

/// Handle one hook invocation.
pub fn record_hook_event(
    store: &EventStore,
    pane_id: Option<&str>,
    event: &str,
    payload: &HookPayload,
    now: DateTime<Utc>,
) -> Result<HookOutcome, StoreError> {
    let Some(pane_id) = pane_id.filter(|p| !p.is_empty()) else {
        return Ok(HookOutcome::Ignored);
    };
    let Some(status) = map_event_to_status(event, payload.notification_type.as_deref()) else {
        tracing::debug!(event, "unrecognized hook event");
        return Ok(HookOutcome::Ignored);
    };
    let record =
        EventRecord::new(pane_id, status, now).with_session_id(payload.session_id.clone());
    store.write(&record).map(HookOutcome::Recorded)
}

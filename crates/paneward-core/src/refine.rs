//! Status refinement state machine.
//!
//! Turns the raw per-poll stream into the user-facing status, adding the
//! derived `Unread` and `Done` states:
//!
//! - **Unread**: the session finished (went idle after working or waiting)
//!   and the operator has not looked at it yet.
//! - **Done**: finished and seen; decays back to `Idle` after a window.
//! - **Idle debounce** (pane-text detection): a single idle sample right
//!   after `Working` is not trusted until enough consecutive idle samples
//!   have been seen.
//!
//! The decision itself is [`transition`], a pure function over
//! [`TransitionKey`]. [`Refiner`] owns the per-pane memory and applies the
//! resulting [`Effects`].

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::seen::SeenMarkers;
use crate::types::{PaneSession, Status};

/// How long the event-driven `Done` state lasts.
pub const DEFAULT_DONE_SECS: i64 = 15;
/// Activity-bound alternative: `Done` holds while the pane saw output recently.
pub const DEFAULT_DONE_ACTIVITY_SECS: i64 = 300;
/// Consecutive-idle threshold used by text classification.
pub const DEFAULT_IDLE_DEBOUNCE: u32 = 3;

// ─── Policy ───────────────────────────────────────────────────────

/// When a `Done` session falls back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneDecay {
    /// Fixed window starting at the Unread -> Done transition.
    Timer(TimeDelta),
    /// Held while the pane's last activity is within the window.
    Activity(TimeDelta),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinePolicy {
    /// Consecutive idle samples (counting the `Working` sample before them)
    /// needed before `Working -> Idle` is trusted. `0` or `1` disables it.
    pub idle_debounce: u32,
    pub decay: DoneDecay,
}

impl Default for RefinePolicy {
    fn default() -> Self {
        Self {
            idle_debounce: 0,
            decay: DoneDecay::Timer(TimeDelta::seconds(DEFAULT_DONE_SECS)),
        }
    }
}

impl RefinePolicy {
    pub fn with_idle_debounce(mut self, n: u32) -> Self {
        self.idle_debounce = n;
        self
    }

    pub fn with_decay(mut self, decay: DoneDecay) -> Self {
        self.decay = decay;
        self
    }
}

// ─── Transition table ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionKey {
    pub raw: Status,
    /// Previous refined status; `None` on first observation.
    pub prev: Option<Status>,
    pub focused: bool,
    /// A seen marker exists for the pane's target.
    pub seen: bool,
    /// Only meaningful when `prev == Some(Done)`.
    pub done_window_open: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    pub mark_seen: bool,
    pub clear_seen: bool,
    pub start_decay: bool,
    pub clear_decay: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: Status,
    pub effects: Effects,
}

impl Transition {
    fn to(status: Status) -> Self {
        Self {
            status,
            effects: Effects::default(),
        }
    }

    fn with(mut self, f: impl FnOnce(&mut Effects)) -> Self {
        f(&mut self.effects);
        self
    }
}

/// One step of the state machine. Debounce is handled by the caller.
pub fn transition(key: TransitionKey) -> Transition {
    use Status::*;

    if key.raw != Idle {
        return Transition::to(key.raw).with(|e| e.clear_decay = true);
    }

    match key.prev {
        Some(Working | Paused) => Transition::to(Unread).with(|e| e.clear_seen = true),
        Some(Unread) if key.focused => Transition::to(Done).with(|e| {
            e.mark_seen = true;
            e.start_decay = true;
        }),
        Some(Unread) if key.seen => Transition::to(Done).with(|e| e.start_decay = true),
        Some(Unread) => Transition::to(Unread),
        Some(Done) if key.done_window_open => {
            Transition::to(Done).with(|e| e.mark_seen = key.focused)
        }
        Some(Done) => Transition::to(Idle).with(|e| {
            e.mark_seen = key.focused;
            e.clear_decay = true;
        }),
        _ => Transition::to(Idle).with(|e| e.mark_seen = key.focused),
    }
}

/// Whether moving `prev -> next` should ring the operator.
pub fn raises_attention(prev: Option<Status>, next: Status) -> bool {
    matches!(
        (prev, next),
        (Some(Status::Working | Status::Paused), Status::Unread)
            | (Some(Status::Working), Status::Paused)
    )
}

// ─── Refiner ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PaneMemory {
    prev: Status,
    idle_streak: u32,
    done_at: Option<DateTime<Utc>>,
}

/// Result of one refinement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineOutcome {
    /// Pane ids that raised an attention signal this pass.
    pub attention: Vec<String>,
    /// Seen markers have changes that still need flushing.
    pub seen_changed: bool,
}

impl RefineOutcome {
    pub fn has_attention(&self) -> bool {
        !self.attention.is_empty()
    }
}

/// Per-pane refinement memory, carried across polls.
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    policy: RefinePolicy,
    memory: HashMap<String, PaneMemory>,
}

impl Refiner {
    pub fn new(policy: RefinePolicy) -> Self {
        Self {
            policy,
            memory: HashMap::new(),
        }
    }

    /// Previous refined status for a pane, if it has been seen before.
    pub fn previous(&self, pane_id: &str) -> Option<Status> {
        self.memory.get(pane_id).map(|m| m.prev)
    }

    /// Refine `sessions` in place. Each session's `status` must hold the raw
    /// status on entry and holds the refined status on return. Memory for
    /// panes not in `sessions` is dropped.
    pub fn refine(
        &mut self,
        sessions: &mut [PaneSession],
        seen: &mut SeenMarkers,
        now: DateTime<Utc>,
    ) -> RefineOutcome {
        let mut outcome = RefineOutcome::default();

        for session in sessions.iter_mut() {
            let mem = self.memory.remove(session.pane_id());
            let prev = mem.as_ref().map(|m| m.prev);
            let next = self.step(session, mem, seen, now);
            if raises_attention(prev, next.prev) {
                outcome.attention.push(session.pane_id().to_string());
            }
            session.status = next.prev;
            self.memory.insert(session.pane_id().to_string(), next);
        }

        self.memory
            .retain(|id, _| sessions.iter().any(|s| s.pane_id() == id));
        outcome.seen_changed = seen.is_dirty();
        outcome
    }

    fn step(
        &self,
        session: &PaneSession,
        mem: Option<PaneMemory>,
        seen: &mut SeenMarkers,
        now: DateTime<Utc>,
    ) -> PaneMemory {
        let raw = session.status;
        let prev = mem.as_ref().map(|m| m.prev);
        let mut mem = mem.unwrap_or_default();

        if self.policy.idle_debounce > 1 && raw == Status::Idle && prev == Some(Status::Working)
        {
            mem.idle_streak += 1;
            if mem.idle_streak + 1 < self.policy.idle_debounce {
                mem.prev = Status::Working;
                return mem;
            }
        }
        mem.idle_streak = 0;

        let target = session.target();
        let done_window_open = prev == Some(Status::Done)
            && match self.policy.decay {
                DoneDecay::Timer(window) => mem.done_at.is_some_and(|at| now - at < window),
                DoneDecay::Activity(window) => now - session.pane.last_activity < window,
            };

        let t = transition(TransitionKey {
            raw,
            prev,
            focused: session.pane.is_focused,
            seen: seen.is_seen(&target),
            done_window_open,
        });

        if t.effects.clear_seen {
            seen.clear(&target);
        }
        if t.effects.mark_seen {
            seen.mark_seen(&target, now);
        }
        if t.effects.start_decay {
            mem.done_at = Some(now);
        }
        if t.effects.clear_decay {
            mem.done_at = None;
        }
        mem.prev = t.status;
        mem
    }
}

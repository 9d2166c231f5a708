//! The status-detection capability.
//!
//! Two strategies exist: lifecycle events recorded by the monitored program
//! itself, and passive inspection of the pane's visible text. They are
//! mutually exclusive policy choices selected once at construction; the
//! resolver only sees this trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::refine::RefinePolicy;
use crate::types::Status;

/// Which detection strategy a [`StatusSource`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionKind {
    /// Lifecycle events written to the event store.
    Events,
    /// Heuristic classification of captured pane text.
    PaneText,
}

impl DetectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::PaneText => "pane-text",
        }
    }

    /// Refinement policy that suits this strategy's noise profile.
    ///
    /// Text classification can flicker to a false idle mid-redraw, so it is
    /// debounced; lifecycle events are trusted as soon as they land.
    pub fn default_policy(self) -> RefinePolicy {
        match self {
            Self::Events => RefinePolicy::default(),
            Self::PaneText => RefinePolicy::default().with_idle_debounce(3),
        }
    }
}

/// Produces raw statuses for occupied panes.
///
/// Implementations return only `Working`, `Paused`, `Idle`, `Error`,
/// `Exited` or `Unknown`.
pub trait StatusSource: Send + Sync {
    fn kind(&self) -> DetectionKind;

    /// Observe the given panes. Called once per poll with every pane whose
    /// occupant is alive; panes missing from the result resolve to `Unknown`.
    fn observe(&self, pane_ids: &[&str]) -> HashMap<String, Status>;
}

impl<T: StatusSource + ?Sized> StatusSource for std::sync::Arc<T> {
    fn kind(&self) -> DetectionKind {
        (**self).kind()
    }

    fn observe(&self, pane_ids: &[&str]) -> HashMap<String, Status> {
        (**self).observe(pane_ids)
    }
}

//! paneward-core: status detection and reconciliation engine.
//!
//! Pure logic only. Everything that shells out or touches the filesystem
//! lives in the source and tmux crates; this crate turns their point-in-time
//! observations into stable, user-facing session statuses.

pub mod merge;
pub mod process;
pub mod refine;
pub mod resolver;
pub mod seen;
pub mod source;
pub mod types;

pub use process::{ProcessRecord, ProcessTable};
pub use merge::{apply_vcs, carry_forward, has_changed};
pub use refine::{DoneDecay, RefineOutcome, RefinePolicy, Refiner};
pub use resolver::resolve_panes;
pub use seen::SeenMarkers;
pub use source::{DetectionKind, StatusSource};
pub use types::{PaneInfo, PaneSession, Status, VcsSummary};

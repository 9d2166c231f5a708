//! paneward-tmux: multiplexer and OS process IO boundary.
//! Runs `tmux` and `ps`, parses their output into core types. No status
//! logic lives here.

pub mod control;
pub mod error;
pub mod executor;
pub mod pane_info;
pub mod process;

pub use control::{
    DASHBOARD_PANE_TITLE, PaneTextCapture, capture_visible, focus_window, set_pane_title,
    spawn_window,
};
pub use error::TmuxError;
pub use executor::{TmuxCommandRunner, TmuxExecutor};
pub use pane_info::{LIST_PANES_FORMAT, list_panes, parse_list_panes_output};
pub use process::{ProcessLister, PsProcessLister};

//! OS process snapshot via `ps`.

use paneward_core::ProcessTable;

use crate::error::TmuxError;

/// Produces one process table per poll.
pub trait ProcessLister: Send + Sync {
    fn snapshot(&self) -> Result<ProcessTable, TmuxError>;
}

impl<T: ProcessLister + ?Sized> ProcessLister for std::sync::Arc<T> {
    fn snapshot(&self) -> Result<ProcessTable, TmuxError> {
        (**self).snapshot()
    }
}

/// `ps -eo pid=,ppid=,comm=`, one call per snapshot.
#[derive(Debug, Clone)]
pub struct PsProcessLister {
    ps_bin: String,
}

impl PsProcessLister {
    pub fn new(ps_bin: impl Into<String>) -> Self {
        Self {
            ps_bin: ps_bin.into(),
        }
    }
}

impl Default for PsProcessLister {
    fn default() -> Self {
        Self::new("ps")
    }
}

impl ProcessLister for PsProcessLister {
    fn snapshot(&self) -> Result<ProcessTable, TmuxError> {
        let output = std::process::Command::new(&self.ps_bin)
            .args(["-eo", "pid=,ppid=,comm="])
            .output()?;
        if !output.status.success() {
            return Err(TmuxError::ProcessScan(format!(
                "{} exited with {}",
                self.ps_bin,
                output.status.code().unwrap_or(-1)
            )));
        }
        Ok(ProcessTable::parse(&String::from_utf8_lossy(&output.stdout)))
    }
}

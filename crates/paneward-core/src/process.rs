//! Per-poll process table: who is running, and who is whose child.

use std::collections::{HashMap, VecDeque};

/// How many generations below a pane's root process are searched.
/// Covers `shell -> runtime -> program`.
pub const MAX_SEARCH_DEPTH: usize = 2;

/// One entry from the OS process listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    /// Command basename (`/usr/bin/zsh` -> `zsh`).
    pub comm: String,
}

/// Snapshot of all processes plus a parent -> children index.
///
/// Built once per poll so every pane is resolved against the same view.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    procs: HashMap<u32, ProcessRecord>,
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessTable {
    pub fn from_records(records: impl IntoIterator<Item = ProcessRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.children.entry(record.ppid).or_default().push(record.pid);
            table.procs.insert(record.pid, record);
        }
        table
    }

    /// Parse `ps -eo pid=,ppid=,comm=` output.
    ///
    /// Malformed lines (fewer than three fields, non-numeric pid/ppid, or a
    /// header row) are skipped rather than failing the whole table.
    pub fn parse(output: &str) -> Self {
        Self::from_records(output.lines().filter_map(parse_ps_line))
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.procs.get(&pid)
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.procs.contains_key(&pid)
    }

    pub fn children_of(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find the monitored program under `root_pid`.
    ///
    /// The root itself counts (a window spawned directly with the program),
    /// then children, then grandchildren. Nothing deeper is searched.
    pub fn find_monitored_descendant(&self, root_pid: u32, program: &str) -> Option<u32> {
        let mut queue = VecDeque::from([(root_pid, 0usize)]);
        while let Some((pid, depth)) = queue.pop_front() {
            if self.get(pid).is_some_and(|p| p.comm == program) {
                return Some(pid);
            }
            if depth < MAX_SEARCH_DEPTH {
                queue.extend(self.children_of(pid).iter().map(|&c| (c, depth + 1)));
            }
        }
        None
    }
}

fn parse_ps_line(line: &str) -> Option<ProcessRecord> {
    let mut fields = line.split_whitespace();
    let pid = fields.next()?.parse().ok()?;
    let ppid = fields.next()?.parse().ok()?;
    let comm = fields.collect::<Vec<_>>().join(" ");
    if comm.is_empty() {
        return None;
    }
    Some(ProcessRecord {
        pid,
        ppid,
        comm: basename(&comm).to_string(),
    })
}

fn basename(comm: &str) -> &str {
    comm.rsplit('/').next().unwrap_or(comm)
}

#[cfg(test)]
pub(crate) fn table(entries: &[(u32, u32, &str)]) -> ProcessTable {
    ProcessTable::from_records(entries.iter().map(|&(pid, ppid, comm)| ProcessRecord {
        pid,
        ppid,
        comm: comm.to_string(),
    }))
}

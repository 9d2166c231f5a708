//! Per-directory git summary with a short TTL cache.

use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use paneward_core::VcsSummary;

type Fetch = Box<dyn Fn(&str) -> Option<VcsSummary> + Send + Sync>;

/// TTL cache in front of a fetch function, shared by concurrent per-pane
/// lookups. Failed fetches are cached too, so a non-repo directory is not
/// re-probed on every poll.
pub struct VcsCache {
    ttl: Duration,
    fetch: Fetch,
    entries: Mutex<HashMap<String, (Instant, Option<VcsSummary>)>>,
}

impl VcsCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_fetch(ttl, git_summary)
    }

    pub fn with_fetch(
        ttl: Duration,
        fetch: impl Fn(&str) -> Option<VcsSummary> + Send + Sync + 'static,
    ) -> Self {
        Self {
            ttl,
            fetch: Box::new(fetch),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, dir: &str) -> Option<VcsSummary> {
        if let Ok(entries) = self.entries.lock()
            && let Some((at, summary)) = entries.get(dir)
            && at.elapsed() < self.ttl
        {
            return summary.clone();
        }

        // Fetch outside the lock; concurrent misses for one dir may both run.
        let summary = (self.fetch)(dir);
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, (at, _)| at.elapsed() < self.ttl);
            entries.insert(dir.to_string(), (Instant::now(), summary.clone()));
        }
        summary
    }
}

/// Branch plus staged and unstaged line counts. `None` when `dir` is not a
/// git work tree or git is unavailable.
pub fn git_summary(dir: &str) -> Option<VcsSummary> {
    let branch = git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let (mut added, mut removed) = (0, 0);
    for args in [&["diff", "--shortstat"][..], &["diff", "--cached", "--shortstat"][..]] {
        if let Some(out) = git(dir, args) {
            let (a, r) = parse_shortstat(&out);
            added += a;
            removed += r;
        }
    }
    Some(VcsSummary {
        branch: branch.trim().to_string(),
        added,
        removed,
        dirty: added > 0 || removed > 0,
    })
}

fn git(dir: &str, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `" 3 files changed, 10 insertions(+), 2 deletions(-)"` -> `(10, 2)`.
pub fn parse_shortstat(line: &str) -> (u32, u32) {
    let mut added = 0;
    let mut removed = 0;
    for part in line.trim().split(',') {
        let mut words = part.split_whitespace();
        let (Some(n), Some(kind)) = (words.next(), words.next()) else {
            continue;
        };
        let Ok(n) = n.parse::<u32>() else {
            continue;
        };
        if kind.starts_with("insertion") {
            added = n;
        } else if kind.starts_with("deletion") {
            removed = n;
        }
    }
    (added, removed)
}

//! Run state tracking
//!
//! A crawl run moves through a small state machine: it is set up
//! (`Initialized`), drains the frontier (`Running`), removes rows the run
//! did not touch (`Sweeping`), and finishes (`Completed`). Unrecoverable
//! storage failures or cancellation divert it to `Aborted`, which skips
//! the sweep so no surviving row is ever deleted on bad information.

use std::fmt;

/// State of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Run counter advanced, page map loaded, frontier seeded
    Initialized,
    /// Workers are draining the frontier
    Running,
    /// Frontier exhausted; stale rows are being deleted
    Sweeping,
    /// Sweep finished; the database reflects exactly this run
    Completed,
    /// Run stopped early; the sweep was skipped
    Aborted,
}

impl RunState {
    /// Returns true if the run can move from this state to `to`
    pub fn can_transition(&self, to: RunState) -> bool {
        matches!(
            (self, to),
            (Self::Initialized, Self::Running)
                | (Self::Running, Self::Sweeping)
                | (Self::Running, Self::Aborted)
                | (Self::Sweeping, Self::Completed)
                | (Self::Sweeping, Self::Aborted)
        )
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true only for a run whose sweep ran to completion
    ///
    /// Only after a completed run may stored rows be trusted to carry the
    /// site's current run counter.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Sweeping => "sweeping",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Prior-run knowledge about one page, loaded in bulk at run start
///
/// The coordinator consults this map for change detection instead of
/// querying the database per URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Database row id
    pub id: i64,
    /// Content hash recorded the last time the page was processed
    pub hash: String,
    /// Run counter recorded on the row
    pub run_id: i64,
}

/// Scan progress reporting: lightweight messages sent from the scan
/// thread to whoever holds the [`ScanHandle`](super::ScanHandle), plus the
/// orchestrator's pollable status.
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which part of a full scan is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPhase {
    Preparing,
    Folders,
    Materials,
    Finalizing,
}

/// Counters accumulated over one scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub materials: usize,
    /// Records removed by survivorship pruning. Always 0 for partial scans.
    pub pruned: usize,
}

impl ScanSummary {
    pub fn merged(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Progress updates sent from the scan thread.
#[derive(Clone, Debug)]
pub enum ScanProgress {
    /// Sent at every cooperative yield. `fraction` never decreases within
    /// one scan.
    Update { fraction: f32, phase: ScanPhase },
    /// Scanning completed successfully.
    Complete {
        duration: Duration,
        summary: ScanSummary,
    },
    /// Stopped at a yield point after cancellation was requested. Nothing
    /// was pruned.
    Cancelled { summary: ScanSummary },
    /// An unexpected error or panic ended the scan.
    Failed { message: String },
}

/// Observable orchestrator state.
///
/// `Completed`, `Cancelled` and `Failed` are momentary: the orchestrator
/// returns to `Idle` straight after, and the terminal state is kept as
/// [`ScanStatus::last_finished`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug)]
struct StatusInner {
    state: ScanState,
    progress: f32,
    last_finished: Option<ScanState>,
}

/// Shared status of the orchestrator's single full-scan slot.
#[derive(Debug)]
pub struct ScanStatus {
    running: AtomicBool,
    inner: Mutex<StatusInner>,
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            inner: Mutex::new(StatusInner {
                state: ScanState::Idle,
                progress: 0.0,
                last_finished: None,
            }),
        }
    }
}

impl ScanStatus {
    /// Claim the scan slot. `None` if a scan is already running.
    pub(crate) fn try_begin(status: &Arc<Self>) -> Option<RunningGuard> {
        if status
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        {
            let mut inner = status.inner.lock();
            inner.state = ScanState::Running;
            inner.progress = 0.0;
        }
        Some(RunningGuard {
            status: Arc::clone(status),
            finished: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> f32 {
        self.inner.lock().progress
    }

    pub fn state(&self) -> ScanState {
        self.inner.lock().state
    }

    /// Terminal state of the most recent full scan.
    pub fn last_finished(&self) -> Option<ScanState> {
        self.inner.lock().last_finished
    }

    pub(crate) fn set_progress(&self, fraction: f32) {
        let mut inner = self.inner.lock();
        inner.progress = inner.progress.max(fraction);
    }
}

/// Holds the scan slot. Dropping it returns the orchestrator to `Idle`,
/// also when the scan thread unwinds.
pub(crate) struct RunningGuard {
    status: Arc<ScanStatus>,
    finished: Option<ScanState>,
}

impl RunningGuard {
    pub(crate) fn finish(&mut self, state: ScanState) {
        self.status.inner.lock().state = state;
        self.finished = Some(state);
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        {
            let mut inner = self.status.inner.lock();
            inner.last_finished = Some(self.finished.unwrap_or(ScanState::Failed));
            inner.state = ScanState::Idle;
        }
        self.status.running.store(false, Ordering::Release);
    }
}

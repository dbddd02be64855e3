//! Shared counters and run statistics
//!
//! The attempt/success counters are the only cross-worker mutable state in
//! the whole harness. Every worker completion takes the mutex exactly once:
//! the same critical section bumps the counters and decides which console
//! line, if any, is due. The every-100th progress line uses the shared
//! global count, so its batch boundaries are best-effort under load; the
//! counters themselves are always consistent.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{ensure, Result};

use crate::probe::ProbeOutcome;

/// Progress line cadence, in attempts.
const PROGRESS_INTERVAL: u64 = 100;
/// Failure messages are truncated to this many characters for display.
const ERROR_PREVIEW_CHARS: usize = 100;

/// Monotonic view of the counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Total probes attempted.
    pub attempts: u64,
    /// Probes the compiler accepted.
    pub successes: u64,
}

/// Attempt/success counters shared by every worker in a run.
#[derive(Debug, Default)]
pub struct SharedCounters {
    inner: Mutex<Snapshot>,
}

impl SharedCounters {
    /// Fresh counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished probe and emit any console lines that are due.
    /// This is the single mutual-exclusion scope per worker completion.
    /// Write failures (a closed stdout, say) are swallowed: a broken pipe
    /// must not panic while the mutex is held and poison it for every
    /// other worker.
    pub fn record(&self, outcome: &ProbeOutcome, show_errors: bool) -> Snapshot {
        let mut counts = self.inner.lock().expect("counter mutex poisoned");
        counts.attempts += 1;

        let mut out = io::stdout();
        if outcome.success {
            counts.successes += 1;
            let saved = outcome
                .saved_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "Compilation successful! ({}/{}) - saved as {}",
                counts.successes, counts.attempts, saved
            );
        } else if show_errors {
            if let Some(error) = &outcome.error {
                let _ = writeln!(out, "Compilation failed: {}", truncate_error(error));
            }
        }

        if counts.attempts % PROGRESS_INTERVAL == 0 {
            let rate = counts.successes as f64 / counts.attempts as f64 * 100.0;
            let _ = writeln!(
                out,
                "Progress: {} attempts, {} successes ({:.2}%)",
                counts.attempts, counts.successes, rate
            );
        }

        *counts
    }

    /// Current counter values.
    pub fn snapshot(&self) -> Snapshot {
        *self.inner.lock().expect("counter mutex poisoned")
    }
}

fn truncate_error(error: &str) -> String {
    let preview: String = error.chars().take(ERROR_PREVIEW_CHARS).collect();
    if error.chars().count() > ERROR_PREVIEW_CHARS {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Derived, read-only view of a run: computed on demand from a counter
/// snapshot and the elapsed wall time.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    /// Total probes attempted.
    pub attempts: u64,
    /// Probes the compiler accepted.
    pub successes: u64,
    /// Wall time since the run started.
    pub elapsed: Duration,
    /// Successes as a percentage of attempts (0 when nothing ran).
    pub success_rate: f64,
    /// Attempts per second of wall time.
    pub throughput: f64,
}

impl RunStats {
    /// Compute run statistics. Division edge cases come back as errors so
    /// the caller can report them without crashing the process.
    pub fn compute(snapshot: Snapshot, elapsed: Duration) -> Result<Self> {
        let secs = elapsed.as_secs_f64();
        ensure!(
            secs.is_finite() && secs > 0.0,
            "elapsed wall time is not positive ({secs} s)"
        );
        ensure!(
            snapshot.successes <= snapshot.attempts,
            "counter snapshot is inconsistent: {} successes > {} attempts",
            snapshot.successes,
            snapshot.attempts
        );

        let success_rate = if snapshot.attempts > 0 {
            snapshot.successes as f64 / snapshot.attempts as f64 * 100.0
        } else {
            0.0
        };

        Ok(Self {
            attempts: snapshot.attempts,
            successes: snapshot.successes,
            elapsed,
            success_rate,
            throughput: snapshot.attempts as f64 / secs,
        })
    }
}

//! Dispatch loop
//!
//! The dispatcher owns the worker pool and the stop flag. Bounded mode runs
//! a fixed number of tasks; unbounded mode keeps submitting batches of
//! `jobs × 10` until interrupted. Results are drained in completion order;
//! nothing downstream depends on submission order.
//!
//! Workers are pool threads, each owning one blocking compiler child
//! process at a time, so pool size bounds both thread and subprocess
//! concurrency. Interruption is checked at batch boundaries and again at
//! each task start: a Ctrl+C never waits for a full extra batch, and
//! whatever the counters held at that point feeds the final summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::charset::Charset;
use crate::counters::{RunStats, SharedCounters};
use crate::format::{coverage_eta, format_count};
use crate::probe::Prober;
use crate::worker::{run_task, Task};

/// Unbounded mode submits this many tasks per pool thread per batch.
const BATCH_TASKS_PER_JOB: u64 = 10;

/// Owns the pool, the counters, and the dispatch loop for one run.
pub struct Dispatcher {
    pool: ThreadPool,
    jobs: usize,
    charset: Arc<Charset>,
    content_len: usize,
    prober: Prober,
    show_errors: bool,
    counters: Arc<SharedCounters>,
    stop: Arc<AtomicBool>,
    started: Instant,
}

impl Dispatcher {
    /// Build a dispatcher with a fixed pool of `jobs` workers.
    pub fn new(
        jobs: usize,
        charset: Arc<Charset>,
        content_len: usize,
        prober: Prober,
        show_errors: bool,
    ) -> Result<Self> {
        let jobs = jobs.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build worker pool")?;

        Ok(Self {
            pool,
            jobs,
            charset,
            content_len,
            prober,
            show_errors,
            counters: Arc::new(SharedCounters::new()),
            stop: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
        })
    }

    /// Flag that stops further task submission when set. Hand this to a
    /// signal handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Counters shared by all workers of this run.
    pub fn counters(&self) -> Arc<SharedCounters> {
        Arc::clone(&self.counters)
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run exactly `total` tasks with ids `0..total`, draining results in
    /// completion order. Returns early (without error) when interrupted.
    pub fn run_bounded(&self, total: u64) {
        let tasks: Vec<Task> = (0..total).map(|id| self.task(id)).collect();
        self.pool.install(|| {
            tasks.par_iter().for_each(|task| {
                if self.stopped() {
                    return;
                }
                run_task(task, &self.prober, &self.counters, self.show_errors);
            });
        });
        if self.stopped() {
            tracing::info!("bounded run interrupted before completion");
        }
    }

    /// Submit batches of `jobs × 10` tasks until the stop flag is set,
    /// printing a rolling throughput line after each completed batch.
    pub fn run_unbounded(&self) {
        let batch_size = self.jobs as u64 * BATCH_TASKS_PER_JOB;
        let mut next_id: u64 = 0;

        while !self.stopped() {
            let tasks: Vec<Task> = (next_id..next_id + batch_size)
                .map(|id| self.task(id))
                .collect();
            next_id += batch_size;

            self.pool.install(|| {
                tasks.par_iter().for_each(|task| {
                    if self.stopped() {
                        return;
                    }
                    run_task(task, &self.prober, &self.counters, self.show_errors);
                });
            });

            if self.stopped() {
                break;
            }

            let snapshot = self.counters.snapshot();
            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                snapshot.attempts as f64 / elapsed
            } else {
                0.0
            };
            println!(
                "Processing speed: {:.2} probes per second (total: {})",
                rate,
                format_count(snapshot.attempts)
            );
        }
    }

    /// Print the final summary for the whole run. Statistics trouble is
    /// reported, never propagated.
    pub fn print_summary(&self, combination_space: f64) {
        match RunStats::compute(self.counters.snapshot(), self.started.elapsed()) {
            Ok(stats) => {
                println!(
                    "\nRun complete. Total: {} attempts, {} successes ({:.2}%)",
                    format_count(stats.attempts),
                    format_count(stats.successes),
                    stats.success_rate
                );
                println!("Processing speed: {:.2} probes per second", stats.throughput);
                println!("Time elapsed: {:.2} seconds", stats.elapsed.as_secs_f64());
                if let Some(eta) = coverage_eta(combination_space, stats.throughput) {
                    println!("Testing every combination would take approximately {eta}");
                }
            }
            Err(e) => eprintln!("Error computing run statistics: {e}"),
        }
    }

    fn task(&self, id: u64) -> Task {
        Task {
            id,
            content_len: self.content_len,
            charset: Arc::clone(&self.charset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharsetOptions;
    use std::time::Duration;

    fn dispatcher(compiler: &str, dir: &std::path::Path) -> Dispatcher {
        let charset = Arc::new(
            Charset::build(&CharsetOptions {
                custom: Some("0123456789".to_string()),
                ..Default::default()
            })
            .unwrap(),
        );
        let prober = Prober::new(compiler, Duration::from_secs(2), dir).unwrap();
        Dispatcher::new(2, charset, 1, prober, false).unwrap()
    }

    #[test]
    fn bounded_run_attempts_exactly_t_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher("false", dir.path());
        d.run_bounded(25);

        let snap = d.counters().snapshot();
        assert_eq!(snap.attempts, 25);
        assert_eq!(snap.successes, 0);
    }

    #[test]
    fn bounded_run_counts_successes_up_to_t() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher("true", dir.path());
        d.run_bounded(10);

        let snap = d.counters().snapshot();
        assert_eq!(snap.attempts, 10);
        assert_eq!(snap.successes, 10);
    }

    #[test]
    fn stop_flag_skips_remaining_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher("true", dir.path());
        d.stop_flag().store(true, Ordering::Relaxed);
        d.run_bounded(50);

        let snap = d.counters().snapshot();
        assert_eq!(snap.attempts, 0);
        assert!(snap.successes <= snap.attempts);
        // Summary must not hang or panic after an interrupt.
        d.print_summary(100.0);
    }
}

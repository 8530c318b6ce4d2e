// src/exec/pool.rs

//! Bounded fan-out of one task's workload over OS threads.
//!
//! The calling thread is worker 0: it spawns at most `max_threads - 1`
//! helpers (never more than there are items), then drains the same queue
//! itself. Every worker appends to its own `<task>-T<i>.log`; a failure is
//! recorded in the worker's private slot and never stops the other workers.
//! A panicking invocation counts as a failed item.
//! Once the completion counter reaches zero the caller collects the slots and
//! removes log files that stayed empty.

use std::any::Any;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::exec::command::open_log;

/// Outcome of draining one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Number of items taken off the queue and invoked.
    pub processed: usize,
    /// Helper threads spawned in addition to the caller.
    pub spawned: usize,
    /// Logs of the workers that saw at least one failed invocation.
    pub failed_logs: Vec<PathBuf>,
}

impl PoolReport {
    pub fn failed(&self) -> bool {
        !self.failed_logs.is_empty()
    }

    /// Error text listing every failed worker log, one per line.
    pub fn failure_message(&self) -> String {
        let mut msg = String::from("Execution failure! Check logs:");
        for log in &self.failed_logs {
            msg.push('\n');
            msg.push_str(&log.display().to_string());
        }
        msg
    }
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    task_name: String,
    log_dir: PathBuf,
    max_threads: usize,
}

struct WorkerSlot {
    log: File,
    failed: bool,
    processed: usize,
}

struct Shared {
    queue: Mutex<VecDeque<Vec<String>>>,
    remaining: AtomicUsize,
    done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Vec<String>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkerPool {
    /// `max_threads` counts the caller; `0` is treated as `1`.
    pub fn new(
        task_name: impl Into<String>,
        log_dir: impl Into<PathBuf>,
        max_threads: usize,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            log_dir: log_dir.into(),
            max_threads: max_threads.max(1),
        }
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// `<log_dir>/<task>-T<worker>.log`
    pub fn log_path(&self, worker: usize) -> PathBuf {
        self.log_dir.join(format!("{}-T{}.log", self.task_name, worker))
    }

    /// Invoke `invoke` once per item, spread over the worker budget.
    ///
    /// `invoke` returns `true` on success. It receives the item's argument
    /// list and the log file of the worker running it.
    pub fn drain<F>(&self, items: Vec<Vec<String>>, invoke: F) -> Result<PoolReport>
    where
        F: Fn(&[String], &mut File) -> bool + Sync,
    {
        let total = items.len();
        let spawned = (self.max_threads - 1).min(total);

        fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("creating log dir {:?}", self.log_dir))?;

        let mut slots = (0..=spawned)
            .map(|i| {
                Ok(WorkerSlot {
                    log: open_log(&self.log_path(i))?,
                    failed: false,
                    processed: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let shared = Shared {
            queue: Mutex::new(VecDeque::from(items)),
            remaining: AtomicUsize::new(total),
            done: Condvar::new(),
        };

        info!(
            task = %self.task_name,
            items = total,
            threads = spawned + 1,
            "draining work queue"
        );

        thread::scope(|scope| -> Result<()> {
            let Some((own, helpers)) = slots.split_first_mut() else {
                return Ok(());
            };

            for (offset, slot) in helpers.iter_mut().enumerate() {
                let index = offset + 1;
                let shared = &shared;
                let invoke = &invoke;
                thread::Builder::new()
                    .name(format!("{}-T{index}", self.task_name))
                    .spawn_scoped(scope, move || worker_loop(index, slot, shared, invoke))
                    .with_context(|| format!("spawning worker {index} for {}", self.task_name))?;
            }

            worker_loop(0, own, &shared, &invoke);

            let guard = shared.lock();
            let _guard = shared
                .done
                .wait_while(guard, |_| shared.remaining.load(Ordering::SeqCst) > 0)
                .unwrap_or_else(PoisonError::into_inner);
            Ok(())
        })?;

        let mut report = PoolReport {
            spawned,
            ..PoolReport::default()
        };
        for (index, slot) in slots.into_iter().enumerate() {
            report.processed += slot.processed;
            if slot.failed {
                report.failed_logs.push(self.log_path(index));
            }
        }

        self.prune_empty_logs();

        if report.failed() {
            warn!(
                task = %self.task_name,
                failed_workers = report.failed_logs.len(),
                "some work items failed"
            );
        }
        Ok(report)
    }

    /// Remove every `T<i>` log of this pool that has no content.
    fn prune_empty_logs(&self) {
        for index in 0..self.max_threads {
            let path = self.log_path(index);
            if is_empty_file(&path) {
                if let Err(err) = fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %err, "could not remove empty log");
                }
            }
        }
    }
}

fn worker_loop<F>(index: usize, slot: &mut WorkerSlot, shared: &Shared, invoke: &F)
where
    F: Fn(&[String], &mut File) -> bool,
{
    loop {
        let next = shared.lock().pop_front();
        let Some(args) = next else {
            break;
        };

        let log = &mut slot.log;
        let ok = match panic::catch_unwind(AssertUnwindSafe(|| invoke(&args, &mut *log))) {
            Ok(ok) => ok,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(worker = index, item = ?args.first(), %reason, "work item panicked");
                // Keep the log non-empty so it survives pruning.
                let _ = writeln!(log, "{:?} panicked: {reason}", args.first());
                false
            }
        };
        if !ok {
            slot.failed = true;
            debug!(worker = index, item = ?args.first(), "work item failed");
        }
        slot.processed += 1;

        let _ = shared
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    let _guard = shared.lock();
    shared.done.notify_all();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn is_empty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() == 0).unwrap_or(false)
}

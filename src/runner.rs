//! Executing a graph on a pool of workers.
//!
//! A [`Runner`] owns a compiled [`Graph`], a ready queue and a worker
//! pool. Each [`execute`](Runner::execute) resets every node, enqueues
//! the root and hands back a [`RunHandle`]; workers drain the queue,
//! enqueueing each finished node's successors, until every leaf has run
//! (success) or a node fails (the error is stored on the handle).
//!
//! A runner may execute the same graph many times in succession; await
//! each run's handle before starting the next.

use crate::cell::ValueCell;
use crate::error::RunError;
use crate::graph::Graph;
use crate::sync::{Arc, Condvar, Mutex};
use crate::types::NodeKey;
use crate::worker::Worker;
use derive_more::Debug;
use std::collections::VecDeque;

/// Ready queue and worker-facing switches, guarded by one lock.
pub(crate) struct QueueState {
    /// False once the runner is shutting down; workers exit on observing it.
    pub(crate) on: bool,
    /// Run generation of the entries currently in the queue.
    pub(crate) run: u64,
    /// Nodes whose predecessors have finished.
    pub(crate) ready: VecDeque<NodeKey>,
    /// Tasks popped but not yet finished; `execute` drains this to zero
    /// before resetting state, so no worker can observe a reset mid-task.
    pub(crate) in_flight: usize,
}

/// Completion state, guarded by its own lock. When both locks are held
/// the completion lock is acquired first.
pub(crate) struct DoneState {
    /// Current run generation; stale workers compare against it.
    pub(crate) run: u64,
    pub(crate) leaves_remaining: usize,
    pub(crate) signal: Arc<ValueCell<Result<(), RunError>>>,
}

/// State shared between the runner and its workers.
pub(crate) struct RunnerCore {
    pub(crate) graph: Graph,
    pub(crate) queue: Mutex<QueueState>,
    pub(crate) queue_avail: Condvar,
    pub(crate) done: Mutex<DoneState>,
}

impl RunnerCore {
    /// Push a node onto the ready queue and wake one worker.
    pub(crate) fn enqueue(&self, key: NodeKey) {
        {
            let mut queue = self.queue.lock().expect("RunnerCore::enqueue: queue lock");
            queue.ready.push_back(key);
        }
        self.queue_avail.notify_one();
    }

    /// Abort run `run`: clear the queue, poison every cell so blocked
    /// gathers wake, store the error. First failure wins; failures from
    /// an already-finished run are ignored.
    pub(crate) fn fail(&self, run: u64, error: RunError) {
        let done = self.done.lock().expect("RunnerCore::fail: completion lock");
        if done.run != run {
            return;
        }
        {
            let mut queue = self.queue.lock().expect("RunnerCore::fail: queue lock");
            queue.ready.clear();
        }
        self.graph.poison_cells();
        let _ = done.signal.set(Err(error));
    }

    /// Count a finished leaf of run `run`; the last one fulfills the
    /// completion signal.
    pub(crate) fn leaf_done(&self, run: u64) {
        let mut done = self.done.lock().expect("RunnerCore::leaf_done: completion lock");
        if done.run != run {
            return;
        }
        done.leaves_remaining -= 1;
        if done.leaves_remaining == 0 {
            let _ = done.signal.set(Ok(()));
        }
    }
}

/// Completion signal of one run: carries success or the stored error.
///
/// Timing out does not stop running workers; drop the runner (or let the
/// graph's callables return) to reclaim threads.
#[derive(Debug, Clone)]
pub struct RunHandle {
    signal: Arc<ValueCell<Result<(), RunError>>>,
}

impl RunHandle {
    /// Block until the run finishes.
    ///
    /// # Errors
    /// The stored [`RunError`] if a node failed.
    pub fn wait(&self) -> Result<(), RunError> {
        self.signal.get().and_then(|outcome| (*outcome).clone())
    }

    /// Block until the run finishes or `timeout` elapses. `None` means
    /// the run is still going.
    #[cfg(not(feature = "loom"))]
    pub fn wait_for(&self, timeout: std::time::Duration) -> Option<Result<(), RunError>> {
        self.signal
            .get_timeout(timeout)
            .map(|outcome| outcome.and_then(|outcome| (*outcome).clone()))
    }
}

/// Drives a [`Graph`] to completion on a pool of worker threads.
#[derive(Debug)]
pub struct Runner {
    #[debug(skip)]
    core: Arc<RunnerCore>,
    #[debug(skip)]
    workers: Vec<Worker>,
    max_leaves: usize,
}

impl Runner {
    /// Construct a runner owning `graph`. The outstanding-leaves target
    /// is captured here.
    pub fn new(graph: Graph) -> Self {
        let max_leaves = graph.leaves();
        Self {
            core: Arc::new(RunnerCore {
                graph,
                queue: Mutex::new(QueueState {
                    on: true,
                    run: 0,
                    ready: VecDeque::new(),
                    in_flight: 0,
                }),
                queue_avail: Condvar::new(),
                done: Mutex::new(DoneState {
                    run: 0,
                    leaves_remaining: 0,
                    signal: Arc::new(ValueCell::new()),
                }),
            }),
            workers: Vec::new(),
            max_leaves,
        }
    }

    /// Execute the call graph asynchronously.
    ///
    /// Resets every node, ensures at least `graph.depth()` workers exist
    /// (the hint for saturating the widest scheduling shape), enqueues the
    /// root and returns the run's completion handle.
    ///
    /// Await the handle before calling `execute` again.
    pub fn execute(&mut self) -> RunHandle {
        // Drain stragglers from the previous run before touching any state
        // they might still read.
        {
            let mut queue = self.core.queue.lock().expect("Runner::execute: queue lock");
            while queue.in_flight > 0 {
                queue = self
                    .core
                    .queue_avail
                    .wait(queue)
                    .expect("Runner::execute: drain wait");
            }
            queue.ready.clear();
        }

        let signal = {
            let mut done = self
                .core
                .done
                .lock()
                .expect("Runner::execute: completion lock");
            done.run += 1;
            let run = done.run;

            self.core.graph.reset_nodes();
            done.leaves_remaining = self.max_leaves;
            let fresh = Arc::new(ValueCell::new());
            done.signal = Arc::clone(&fresh);

            let min_workers = self.core.graph.depth();
            while self.workers.len() < min_workers {
                self.workers.push(Worker::spawn(Arc::clone(&self.core)));
            }
            tracing::debug!(
                run,
                workers = self.workers.len(),
                leaves = self.max_leaves,
                "starting run"
            );

            {
                let mut queue = self.core.queue.lock().expect("Runner::execute: queue lock");
                queue.run = run;
                queue.ready.push_back(Graph::ROOT);
            }
            self.core.queue_avail.notify_one();
            fresh
        };
        RunHandle { signal }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        {
            let mut queue = self.core.queue.lock().expect("Runner::drop: queue lock");
            queue.on = false;
            queue.ready.clear();
        }
        // Wake blocked gathers so no worker waits on a value that will
        // never arrive, then wake idle workers; the pool joins as
        // `workers` drops.
        self.core.graph.poison_cells();
        self.core.queue_avail.notify_all();
    }
}

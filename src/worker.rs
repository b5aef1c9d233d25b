//! Worker threads driving the ready queue.

use crate::error::RunError;
use crate::runner::RunnerCore;
use crate::sync::{Arc, thread};
use crate::types::NodeKey;
use std::panic::{self, AssertUnwindSafe};

/// One OS thread pulling from the runner's ready queue. Joins on drop.
pub(crate) struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(core: Arc<RunnerCore>) -> Self {
        let thread = thread::spawn(move || worker_loop(&core));
        Self {
            thread: Some(thread),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(core: &RunnerCore) {
    while let Some((key, run)) = next_ready(core) {
        match run_node(core, key) {
            Ok(executed) => {
                if executed && core.graph.node(key).children.is_empty() {
                    core.leaf_done(run);
                }
            }
            Err(error) => {
                tracing::error!(%error, "node failed; aborting run");
                core.fail(run, error);
            }
        }
        task_done(core);
    }
}

/// Pop the next ready node, blocking while the queue is empty and the
/// runner remains active. `None` means shutdown.
fn next_ready(core: &RunnerCore) -> Option<(NodeKey, u64)> {
    let mut queue = core.queue.lock().expect("worker: queue lock");
    loop {
        if !queue.on {
            return None;
        }
        if let Some(key) = queue.ready.pop_front() {
            queue.in_flight += 1;
            return Some((key, queue.run));
        }
        queue = core.queue_avail.wait(queue).expect("worker: queue wait");
    }
}

fn task_done(core: &RunnerCore) {
    let idle = {
        let mut queue = core.queue.lock().expect("worker: queue lock");
        queue.in_flight -= 1;
        queue.in_flight == 0
    };
    if idle {
        // The runner may be draining in-flight tasks before a reset.
        core.queue_avail.notify_all();
    }
}

/// Run one node: win the latch, invoke, enqueue successors. `Ok(false)`
/// when another worker already ran it this run.
fn run_node(core: &RunnerCore, key: NodeKey) -> Result<bool, RunError> {
    let node = core.graph.node(key);
    if !node.try_fire() {
        return Ok(false);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| node.invoke())) {
        Ok(Ok(())) => {
            for &child in &node.children {
                core.enqueue(child);
            }
            Ok(true)
        }
        Ok(Err(error)) => Err(error),
        Err(payload) => Err(RunError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

//! One-shot typed value slots.
//!
//! A [`ValueCell`] is the rendezvous between a producer node and its
//! consumers: the producer fills it exactly once per run, any number of
//! consumers block until the value is published and then share a snapshot
//! of it. The runner resets every cell between runs, and poisons every
//! cell when a run is aborted so that no consumer can stay blocked on a
//! value that will never arrive.

use crate::error::RunError;
use crate::sync::{Arc, Condvar, Mutex};
use core::any::Any;
use core::fmt;

enum State<T> {
    Empty,
    Filled(Arc<T>),
    Poisoned,
}

/// A one-shot slot for a value of type `T`.
///
/// States: *empty* → *filled* (→ *poisoned* on an aborted run). Between
/// `set` and `reset` the stored value is immutable and safely readable
/// from any number of threads; readers receive a shared snapshot.
pub struct ValueCell<T> {
    state: Mutex<State<T>>,
    filled: Condvar,
}

impl<T> ValueCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Empty),
            filled: Condvar::new(),
        }
    }

    /// Publish the value. Legal once per run.
    ///
    /// # Errors
    /// [`RunError::DoubleSet`] if the cell is already filled this run,
    /// [`RunError::Aborted`] if the run was aborted in the meantime.
    pub fn set(&self, value: T) -> Result<(), RunError> {
        let mut state = self.state.lock().expect("ValueCell::set: lock");
        match *state {
            State::Empty => {
                *state = State::Filled(Arc::new(value));
                drop(state);
                self.filled.notify_all();
                Ok(())
            }
            State::Filled(_) => Err(RunError::DoubleSet),
            State::Poisoned => Err(RunError::Aborted),
        }
    }

    /// Block until the value is published, then return a shared snapshot.
    ///
    /// # Errors
    /// [`RunError::Aborted`] if the cell is poisoned before a value arrives.
    pub fn get(&self) -> Result<Arc<T>, RunError> {
        let mut state = self.state.lock().expect("ValueCell::get: lock");
        loop {
            match &*state {
                State::Filled(value) => return Ok(Arc::clone(value)),
                State::Poisoned => return Err(RunError::Aborted),
                State::Empty => state = self.filled.wait(state).expect("ValueCell::get: wait"),
            }
        }
    }

    /// Block until the value is published, discarding it. For void-typed
    /// cells this is the only observation.
    ///
    /// # Errors
    /// [`RunError::Aborted`] if the cell is poisoned before a value arrives.
    pub fn wait(&self) -> Result<(), RunError> {
        self.get().map(drop)
    }

    /// Like [`get`](Self::get) with a timeout. `None` means the timeout
    /// elapsed with the cell still empty.
    #[cfg(not(feature = "loom"))]
    pub fn get_timeout(&self, timeout: std::time::Duration) -> Option<Result<Arc<T>, RunError>> {
        let deadline = std::time::Instant::now() + timeout;
        let mut state = self.state.lock().expect("ValueCell::get_timeout: lock");
        loop {
            match &*state {
                State::Filled(value) => return Some(Ok(Arc::clone(value))),
                State::Poisoned => return Some(Err(RunError::Aborted)),
                State::Empty => {
                    let now = std::time::Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let (guard, _) = self
                        .filled
                        .wait_timeout(state, deadline - now)
                        .expect("ValueCell::get_timeout: wait");
                    state = guard;
                }
            }
        }
    }

    /// Abort every pending and future read with [`RunError::Aborted`].
    /// A cell that already holds a value keeps it.
    pub fn poison(&self) {
        let mut state = self.state.lock().expect("ValueCell::poison: lock");
        if let State::Empty = *state {
            *state = State::Poisoned;
            drop(state);
            self.filled.notify_all();
        }
    }

    /// Restore the empty state. Legal only when no consumer is blocked on
    /// the cell, which the runner guarantees by resetting between runs.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("ValueCell::reset: lock");
        *state = State::Empty;
    }
}

impl<T> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match &*self.state.lock().expect("ValueCell::fmt: lock") {
            State::Empty => "empty",
            State::Filled(_) => "filled",
            State::Poisoned => "poisoned",
        };
        f.debug_tuple("ValueCell").field(&tag).finish()
    }
}

/// Type-erased handle to a node's result cell, enough for the run
/// lifecycle (reset, poison) and for connect-time recovery of the typed
/// cell.
pub(crate) trait AnyCell: Send + Sync {
    fn reset(&self);
    fn poison(&self);
    /// The contained `Arc<ValueCell<T>>` as `Any`, for a checked downcast
    /// at connect time.
    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct CellHandle<T>(pub(crate) Arc<ValueCell<T>>);

impl<T: Send + Sync + 'static> AnyCell for CellHandle<T> {
    fn reset(&self) {
        self.0.reset();
    }

    fn poison(&self) {
        self.0.poison();
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_snapshot() {
        let cell = ValueCell::new();
        cell.set(7_u32).unwrap();
        assert_eq!(*cell.get().unwrap(), 7);
        // A second reader observes the same snapshot.
        assert_eq!(*cell.get().unwrap(), 7);
    }

    #[test]
    fn double_set_is_reported() {
        let cell = ValueCell::new();
        cell.set(1_u8).unwrap();
        assert_eq!(cell.set(2), Err(RunError::DoubleSet));
    }

    #[test]
    fn reset_restores_empty() {
        let cell = ValueCell::new();
        cell.set("x").unwrap();
        cell.reset();
        assert!(cell.get_timeout(std::time::Duration::from_millis(1)).is_none());
    }

    #[test]
    fn poison_wakes_blocked_reader() {
        let cell = Arc::new(ValueCell::<u32>::new());
        let reader = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || cell.get())
        };
        // Give the reader a chance to block, then abort.
        std::thread::sleep(std::time::Duration::from_millis(10));
        cell.poison();
        assert_eq!(reader.join().unwrap(), Err(RunError::Aborted));
    }

    #[test]
    fn poison_keeps_published_value() {
        let cell = ValueCell::new();
        cell.set(3_u64).unwrap();
        cell.poison();
        assert_eq!(*cell.get().unwrap(), 3);
    }

    #[test]
    fn reset_clears_poison() {
        let cell = ValueCell::<u32>::new();
        cell.poison();
        cell.reset();
        cell.set(5).unwrap();
        assert_eq!(*cell.get().unwrap(), 5);
    }
}

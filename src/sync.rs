#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        cell::UnsafeCell,
        sync::{
            Arc, Condvar, Mutex,
            atomic::{AtomicBool, Ordering},
        },
        thread,
    };
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use core::{
        cell::UnsafeCell,
        sync::atomic::{AtomicBool, Ordering},
    };
    pub(crate) use std::{
        sync::{Arc, Condvar, Mutex},
        thread,
    };
}

pub(crate) use imp::*;

/// An `UnsafeCell` wrapper that is `Sync` for `T: Send`.
///
/// Exclusivity is not enforced here; callers must guarantee that at most one
/// thread holds the mutable borrow at a time. Inside this crate that
/// guarantee comes from two disciplines: a node's one-shot latch admits a
/// single invoker per run, and every other mutable access happens while the
/// graph is exclusively borrowed or no run is in flight.
pub(crate) struct ExclusiveCell<T>(UnsafeCell<T>);

// SAFETY: access is externally serialized as documented above; `T: Send`
// suffices because no two threads touch the contents concurrently.
unsafe impl<T: Send> Sync for ExclusiveCell<T> {}
unsafe impl<T: Send> Send for ExclusiveCell<T> {}

impl<T> ExclusiveCell<T> {
    pub(crate) fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }

    /// Run `f` with a mutable borrow of the contents.
    ///
    /// # Safety
    /// The caller must guarantee no concurrent access to the same cell.
    #[cfg(not(feature = "loom"))]
    pub(crate) unsafe fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(unsafe { &mut *self.0.get() })
    }

    /// Loom-tracked version of `with_mut`.
    ///
    /// # Safety
    /// The caller must guarantee no concurrent access to the same cell.
    #[cfg(feature = "loom")]
    pub(crate) unsafe fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.0.with_mut(|ptr| f(unsafe { &mut *ptr }))
    }

    /// Run `f` with a shared borrow of the contents.
    ///
    /// # Safety
    /// The caller must guarantee no concurrent mutable access to the same
    /// cell; concurrent shared access is fine.
    #[cfg(not(feature = "loom"))]
    pub(crate) unsafe fn with_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(unsafe { &*self.0.get() })
    }

    /// Loom-tracked version of `with_ref`.
    ///
    /// # Safety
    /// The caller must guarantee no concurrent mutable access to the same
    /// cell; concurrent shared access is fine.
    #[cfg(feature = "loom")]
    pub(crate) unsafe fn with_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(|ptr| f(unsafe { &*ptr }))
    }
}

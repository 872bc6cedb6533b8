// Liveness flag shared by `LiveHandle` and the driver.
//
// Handler calls run under a mutex. `close` flips the flag and then takes the
// same mutex, so once it returns no handler is running or will run, on any
// runtime flavor. A handler that stops its own channel is already inside the
// gate; the thread-local marker lets that call return without waiting on
// itself.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

thread_local! {
    /// Address of the gate whose handler is running on this thread, or 0.
    static RUNNING: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug)]
pub(crate) struct DispatchGate {
    open: AtomicBool,
    lock: Mutex<()>,
}

impl DispatchGate {
    pub(crate) fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            lock: Mutex::new(()),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Run `f` unless the gate is closed.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_open() {
            return None;
        }
        let _marker = Marker::enter(self.id());
        Some(f())
    }

    /// Close the gate and wait out a handler running on another thread.
    ///
    /// Returns `true` for the call that actually closed it.
    pub(crate) fn close(&self) -> bool {
        let was_open = self.open.swap(false, Ordering::AcqRel);
        if RUNNING.with(Cell::get) != self.id() {
            drop(self.lock.lock().unwrap_or_else(PoisonError::into_inner));
        }
        was_open
    }

    fn id(&self) -> usize {
        std::ptr::from_ref(self).addr()
    }
}

/// Restores the outer marker even if the handler panics.
struct Marker(usize);

impl Marker {
    fn enter(id: usize) -> Self {
        Self(RUNNING.with(|running| running.replace(id)))
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        RUNNING.with(|running| running.set(self.0));
    }
}

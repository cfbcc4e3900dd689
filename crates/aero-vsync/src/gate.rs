//! Tick gate: the mutex + condvar rendezvous between the ticker thread and waiters.
//!
//! The ticker is the only writer of `ticked = true`. Waiters write `ticked = false`, and only as
//! the first action of their own wait, while holding the lock. The generation counter advances
//! under the same lock and is what [`WakeMode::Broadcast`] waits on.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::config::WakeMode;

#[derive(Debug, Default)]
struct GateState {
    ticked: bool,
    generation: u64,
    /// Threads currently parked in [`TickGate::wait`].
    waiters: usize,
    /// Set by [`TickGate::close`]; a closed gate never blocks.
    closed: bool,
}

#[derive(Debug)]
pub(crate) struct TickGate {
    state: Mutex<GateState>,
    cv: Condvar,
    wake_mode: WakeMode,
}

impl TickGate {
    pub(crate) fn new(wake_mode: WakeMode) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            cv: Condvar::new(),
            wake_mode,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // A tick callback that panicked poisons the lock, but the state is still consistent (every
        // mutation is a single store), so keep going with the inner guard.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn park<'a>(&self, guard: MutexGuard<'a, GateState>) -> MutexGuard<'a, GateState> {
        match self.cv.wait(guard) {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Publish one tick, then run `on_tick` with the lock still held.
    ///
    /// Waiters woken here cannot return until `on_tick` has finished and the lock is released.
    /// Returns the new tick generation.
    pub(crate) fn fire<F: FnOnce(u64)>(&self, on_tick: F) -> u64 {
        let mut state = self.lock();
        state.ticked = true;
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        match self.wake_mode {
            WakeMode::SingleWaiter => self.cv.notify_one(),
            WakeMode::Broadcast => self.cv.notify_all(),
        }

        on_tick(generation);
        drop(state);
        generation
    }

    /// Block until the next tick fires after this call took the lock.
    ///
    /// A tick that fired before the call is not counted. Returns immediately if the gate is
    /// closed.
    pub(crate) fn wait(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }

        state.waiters += 1;
        match self.wake_mode {
            WakeMode::SingleWaiter => {
                state.ticked = false;
                while !state.ticked && !state.closed {
                    state = self.park(state);
                }
            }
            WakeMode::Broadcast => {
                let seen = state.generation;
                while state.generation == seen && !state.closed {
                    state = self.park(state);
                }
            }
        }
        state.waiters -= 1;
    }

    /// Release every waiter and make all future waits return immediately.
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cv.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub(crate) fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub(crate) fn waiters(&self) -> usize {
        self.lock().waiters
    }
}

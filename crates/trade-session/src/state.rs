//! Connection lifecycle.
//!
//! The current state is an atomic so `Engine::state` never takes a lock.
//! Transitions are serialized by a mutex. The fatal error (if any) and the
//! entry action both run before the new state is published, so a reader
//! that observes `ExitError` always finds the cause in place.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use trade_core::EngineState;

use crate::error::SessionError;

pub(crate) struct StateMachine {
    state: AtomicU8,
    fatal: OnceLock<SessionError>,
    transition: Mutex<()>,
}

impl StateMachine {
    pub(crate) fn new(initial: EngineState) -> Self {
        StateMachine {
            state: AtomicU8::new(initial.as_u8()),
            fatal: OnceLock::new(),
            transition: Mutex::new(()),
        }
    }

    pub(crate) fn get(&self) -> EngineState {
        // Only valid discriminants are ever stored.
        EngineState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(EngineState::ExitError)
    }

    pub(crate) fn fatal(&self) -> Option<&SessionError> {
        self.fatal.get()
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// `cause` is recorded as the fatal error. Returns `false` (and
    /// discards `cause`) when the transition is not legal from the
    /// current state, e.g. a second exit.
    pub(crate) fn transition(&self, next: EngineState, cause: Option<SessionError>) -> bool {
        self.transition_with(next, cause, || {})
    }

    /// Like [`transition`](Self::transition), running `on_enter` under the
    /// transition lock after the cause is recorded and before `next`
    /// becomes visible through [`get`](Self::get).
    pub(crate) fn transition_with(
        &self,
        next: EngineState,
        cause: Option<SessionError>,
        on_enter: impl FnOnce(),
    ) -> bool {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.get();
        if !current.can_transition_to(next) {
            return false;
        }
        if let Some(cause) = cause {
            let _ = self.fatal.set(cause);
        }
        on_enter();
        self.state.store(next.as_u8(), Ordering::Release);
        true
    }
}

//! Debounce and delayed flushing on top of a [`Scheduler`].
//!
//! State is per instance and single-threaded. Pending timer callbacks hold a
//! weak handle, so dropping the last `Debounced` or `Delayed` turns them into
//! no-ops.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::scheduler::{Callback, Scheduler, TimerId};

struct DebounceState<A> {
    scheduler: Rc<dyn Scheduler>,
    f: Box<dyn Fn(A)>,
    wait: Duration,
    immediate: bool,
    timer: Cell<Option<TimerId>>,
}

/// Collapses bursts of calls into one invocation of the wrapped function.
pub struct Debounced<A> {
    state: Rc<DebounceState<A>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

/// Debounce `f` by `wait`.
///
/// Trailing mode (`immediate == false`) calls `f` with the last arguments once
/// `wait` passes without another call. Leading mode calls `f` right away on the
/// first call of a burst and ignores the rest until the timer lapses.
pub fn debounce<A, F>(
    scheduler: Rc<dyn Scheduler>,
    f: F,
    wait: Duration,
    immediate: bool,
) -> Debounced<A>
where
    A: 'static,
    F: Fn(A) + 'static,
{
    Debounced {
        state: Rc::new(DebounceState {
            scheduler,
            f: Box::new(f),
            wait,
            immediate,
            timer: Cell::new(None),
        }),
    }
}

impl<A: 'static> Debounced<A> {
    pub fn call(&self, args: A) {
        let state = &self.state;
        let call_now = state.immediate && state.timer.get().is_none();

        if let Some(id) = state.timer.take() {
            state.scheduler.clear_timeout(id);
        }

        let (now_args, later_args) = if state.immediate {
            (Some(args), None)
        } else {
            (None, Some(args))
        };

        let weak: Weak<DebounceState<A>> = Rc::downgrade(state);
        let later: Callback = Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.timer.set(None);
                if let Some(args) = later_args {
                    (state.f)(args);
                }
            }
        });
        let id = state.scheduler.set_timeout(state.wait, later);
        state.timer.set(Some(id));

        if call_now {
            if let Some(args) = now_args {
                (state.f)(args);
            }
        }
    }

    /// Whether a timer is currently running.
    pub fn is_pending(&self) -> bool {
        self.state.timer.get().is_some()
    }

    /// Drop the pending timer, if any, without calling `f`.
    pub fn cancel(&self) {
        if let Some(id) = self.state.timer.take() {
            self.state.scheduler.clear_timeout(id);
        }
    }
}

struct DelayedState<A> {
    schedule: Box<dyn Fn(Callback)>,
    f: Box<dyn Fn(A)>,
    pending: Cell<bool>,
    last: RefCell<Option<A>>,
}

impl<A> DelayedState<A> {
    fn flush(&self) {
        self.pending.set(false);
        let args = self.last.borrow_mut().take();
        if let Some(args) = args {
            (self.f)(args);
        }
    }
}

/// Coalesces calls until the host runs a scheduled flush.
pub struct Delayed<A> {
    state: Rc<DelayedState<A>>,
}

impl<A> Clone for Delayed<A> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

/// Wrap `f` so that calls only record their arguments, and one flush per
/// burst is handed to `schedule`. The flush calls `f` with the latest
/// arguments.
pub fn delayed<A, S, F>(schedule: S, f: F) -> Delayed<A>
where
    A: 'static,
    S: Fn(Callback) + 'static,
    F: Fn(A) + 'static,
{
    Delayed {
        state: Rc::new(DelayedState {
            schedule: Box::new(schedule),
            f: Box::new(f),
            pending: Cell::new(false),
            last: RefCell::new(None),
        }),
    }
}

impl<A: 'static> Delayed<A> {
    pub fn call(&self, args: A) {
        let state = &self.state;
        *state.last.borrow_mut() = Some(args);
        if state.pending.replace(true) {
            return;
        }
        let weak = Rc::downgrade(state);
        (state.schedule)(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.flush();
            }
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.get()
    }
}

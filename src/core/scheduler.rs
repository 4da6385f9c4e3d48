//! One-shot timers for single-threaded hosts.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub type Callback = Box<dyn FnOnce()>;

/// Sets and clears one-shot timers. Implementations run callbacks on the
/// caller's thread, never concurrently with each other.
pub trait Scheduler {
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerId;

    /// Clearing an unknown or already fired timer is a no-op.
    fn clear_timeout(&self, id: TimerId);
}

struct Timer {
    id: TimerId,
    due: Duration,
    callback: Callback,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Queue {
    /// Remove the earliest timer due at or before `limit`. Timers due at the
    /// same instant fire in the order they were set.
    fn pop_due(&mut self, limit: Option<Duration>) -> Option<Timer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| limit.map_or(true, |limit| timer.due <= limit))
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(idx, _)| idx)?;
        Some(self.timers.remove(idx))
    }
}

/// Deterministic timer queue on a virtual clock. Nothing fires until the host
/// calls [`ManualScheduler::advance`] or [`ManualScheduler::run_all`].
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Queue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    /// Move the clock forward by `by`, firing every timer that comes due,
    /// including timers set by callbacks along the way. Returns how many fired.
    ///
    /// The clock never moves backwards, even when a callback advances it further.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let fired = self.fire_until(Some(target));
        let mut queue = self.queue.borrow_mut();
        queue.now = queue.now.max(target);
        fired
    }

    /// Fire timers until none remain, moving the clock to each due time.
    pub fn run_all(&self) -> usize {
        self.fire_until(None)
    }

    fn fire_until(&self, limit: Option<Duration>) -> usize {
        let mut fired = 0;
        loop {
            let timer = {
                let mut queue = self.queue.borrow_mut();
                let Some(timer) = queue.pop_due(limit) else {
                    break;
                };
                queue.now = queue.now.max(timer.due);
                timer
            };
            // The queue is not borrowed here, so callbacks may set or clear timers.
            (timer.callback)();
            fired += 1;
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerId {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let id = TimerId(queue.next_id);
        let due = queue.now + delay;
        queue.timers.push(Timer { id, due, callback });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.queue.borrow_mut().timers.retain(|timer| timer.id != id);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &queue.now)
            .field("pending", &queue.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = Rc::clone(&log);
        let make = move |name: &'static str| -> Callback {
            let log = Rc::clone(&handle);
            Box::new(move || log.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn advance_fires_due_timers_in_order() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        scheduler.set_timeout(Duration::from_millis(200), make("late"));
        scheduler.set_timeout(Duration::from_millis(100), make("early"));
        scheduler.set_timeout(Duration::from_millis(100), make("early-second"));

        assert_eq!(scheduler.advance(Duration::from_millis(150)), 2);
        assert_eq!(*log.borrow(), vec!["early", "early-second"]);
        assert_eq!(scheduler.now(), Duration::from_millis(150));
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_millis(50));
        assert_eq!(*log.borrow(), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn nested_advance_keeps_the_clock_monotonic() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        let inner = scheduler.clone();
        let jump = make("jump");
        scheduler.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                jump();
                inner.advance(Duration::from_millis(100));
            }),
        );
        scheduler.set_timeout(Duration::from_millis(50), make("during-jump"));

        assert_eq!(scheduler.advance(Duration::from_millis(10)), 1);
        assert_eq!(*log.borrow(), vec!["jump", "during-jump"]);
        assert_eq!(scheduler.now(), Duration::from_millis(105));

        let before = scheduler.now();
        scheduler.set_timeout(Duration::from_millis(1), make("after"));
        scheduler.advance(Duration::from_millis(1));
        assert!(scheduler.now() > before);
        assert_eq!(log.borrow().last(), Some(&"after"));
    }

    #[test]
    fn cleared_timer_never_fires() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        let id = scheduler.set_timeout(Duration::from_millis(10), make("cleared"));
        scheduler.clear_timeout(id);
        scheduler.clear_timeout(id);
        assert_eq!(scheduler.run_all(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn callbacks_can_schedule_more_timers() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        let inner = scheduler.clone();
        let follow_up = make("second");
        let first = make("first");
        scheduler.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                first();
                inner.set_timeout(Duration::from_millis(5), follow_up);
            }),
        );
        assert_eq!(scheduler.run_all(), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(scheduler.now(), Duration::from_millis(10));
    }
}

use crate::error::EngineError;
use crate::ids::{EventId, IdGenerator};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashSet};
use std::panic::{self, AssertUnwindSafe};

/// A scheduled callback. Receives the time it was dispatched at and a
/// handle back into the scheduler so it may arm further events within the
/// same tick: anything scheduled during a callback with `time <= horizon`
/// dispatches before this tick returns.
pub type SchedulerCallback = Box<dyn FnOnce(f64, &mut LookaheadScheduler) + Send>;

struct ScheduledEvent {
    time: f64,
    id: EventId,
    callback: SchedulerCallback,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}
impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    /// Reversed so `BinaryHeap` (a max-heap) pops the smallest `(time, id)`
    /// first, matching the ascending `(time, id)` ordering guarantee.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(CmpOrdering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Delivers future events whose time has entered the lookahead horizon.
///
/// Backed by a min-heap keyed on `(time, id)` so that events scheduled for
/// the same instant dispatch in the order they were scheduled.
pub struct LookaheadScheduler {
    heap: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<EventId>,
    ids: IdGenerator,
    pub lookahead_seconds: f64,
    pub interval_ms: f64,
    running: bool,
}

impl LookaheadScheduler {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            ids: IdGenerator::new(),
            lookahead_seconds: 0.1,
            interval_ms: 25.0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Insert an event; `time` is in the audio-context clock domain.
    /// Returns a cancellation handle.
    pub fn schedule(&mut self, time: f64, callback: SchedulerCallback) -> EventId {
        let id = self.ids.next_event_id();
        self.heap.push(ScheduledEvent { time, id, callback });
        id
    }

    /// Remove an event if still pending; no-op if already dispatched or
    /// unknown.
    pub fn cancel(&mut self, id: EventId) {
        self.cancelled.insert(id);
    }

    /// Drop all pending events.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.heap.len()
    }

    /// Periodic-timer-driven tick: a no-op unless `start()` has been called.
    /// Returns any errors raised by dispatched callbacks, for the caller to
    /// surface as `engine:error` events.
    pub fn tick(&mut self, now: f64) -> Vec<EngineError> {
        if !self.running {
            return Vec::new();
        }
        self.dispatch_within_horizon(now)
    }

    /// Ad-hoc processing of the current window, used when an external clock
    /// tick occurs; runs regardless of `start()`/`stop()`.
    pub fn flush(&mut self, now: f64) -> Vec<EngineError> {
        self.dispatch_within_horizon(now)
    }

    /// Dispatch every remaining event regardless of time (shutdown path).
    pub fn drain_all(&mut self) -> Vec<EngineError> {
        log::debug!("draining {} pending event(s)", self.heap.len());
        let mut errors = Vec::new();
        while let Some(event) = self.heap.pop() {
            if self.cancelled.remove(&event.id) {
                continue;
            }
            if let Some(err) = Self::invoke(event, self) {
                errors.push(err);
            }
        }
        errors
    }

    fn dispatch_within_horizon(&mut self, now: f64) -> Vec<EngineError> {
        let horizon = now + self.lookahead_seconds;
        let mut errors = Vec::new();
        let mut dispatched = 0u32;
        loop {
            match self.heap.peek() {
                Some(event) if event.time <= horizon => {}
                _ => break,
            }
            let event = self.heap.pop().expect("peek guaranteed Some above");
            if self.cancelled.remove(&event.id) {
                log::trace!("skipping cancelled event {}", event.id);
                continue;
            }
            let id = event.id;
            if let Some(err) = Self::invoke(event, self) {
                log::warn!("scheduled event {} panicked: {}", id, err);
                errors.push(err);
            } else {
                dispatched += 1;
            }
        }
        if dispatched > 0 {
            log::trace!("dispatched {} event(s) within horizon {:.3}", dispatched, horizon);
        }
        errors
    }

    /// Invoke a callback, isolating a panic raised inside it so one bad
    /// callback cannot take down the rest of the tick's dispatch.
    fn invoke(event: ScheduledEvent, scheduler: &mut LookaheadScheduler) -> Option<EngineError> {
        let ScheduledEvent { time, callback, .. } = event;
        let result = panic::catch_unwind(AssertUnwindSafe(|| callback(time, scheduler)));
        result.err().map(|payload| {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "scheduled callback panicked".to_string());
            EngineError::scheduling(msg)
        })
    }
}

impl Default for LookaheadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatches_in_ascending_time_id_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut sched = LookaheadScheduler::new();
        sched.start();

        for (time, tag) in [(0.05, 1), (0.01, 2), (0.01, 3), (0.08, 4)] {
            let o = order.clone();
            sched.schedule(time, Box::new(move |_t, _s| o.lock().unwrap().push(tag)));
        }

        sched.tick(0.0);
        assert_eq!(*order.lock().unwrap(), vec![2, 3, 1, 4]);
    }

    #[test]
    fn cancelled_event_never_fires() {
        let fired = Arc::new(Mutex::new(false));
        let mut sched = LookaheadScheduler::new();
        sched.start();

        let f = fired.clone();
        let id = sched.schedule(1.0, Box::new(move |_t, _s| *f.lock().unwrap() = true));
        sched.cancel(id);
        sched.tick(0.0);
        sched.flush(1.5);

        assert!(!*fired.lock().unwrap());
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn callback_can_reschedule_within_same_tick() {
        let fired = Arc::new(Mutex::new(0));
        let mut sched = LookaheadScheduler::new();
        sched.start();

        let f = fired.clone();
        sched.schedule(
            0.01,
            Box::new(move |_t, s| {
                *f.lock().unwrap() += 1;
                let f2 = f.clone();
                s.schedule(0.02, Box::new(move |_t, _s| *f2.lock().unwrap() += 1));
            }),
        );

        sched.tick(0.0);
        assert_eq!(*fired.lock().unwrap(), 2);
    }

    #[test]
    fn panicking_callback_is_isolated() {
        let mut sched = LookaheadScheduler::new();
        sched.start();
        sched.schedule(0.0, Box::new(|_t, _s| panic!("boom")));
        let after = Arc::new(Mutex::new(false));
        let a = after.clone();
        sched.schedule(0.0, Box::new(move |_t, _s| *a.lock().unwrap() = true));

        let errors = sched.tick(0.0);
        assert_eq!(errors.len(), 1);
        assert!(*after.lock().unwrap());
    }
}

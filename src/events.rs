use crate::audio::transport::TransportSnapshot;
use crate::error::EngineError;
use crate::ids::TrackId;

/// Events the façade emits on its bus. Handlers run synchronously on the
/// control thread, in the insertion order they were registered.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Full transport snapshot, emitted on every transport mutation.
    TransportState(TransportSnapshot),
    /// Periodic while playing, carrying `{contextTime, positionSeconds, bar,
    /// beat, tempo}`.
    TransportPosition {
        context_time: f64,
        position_seconds: f64,
        bar: u32,
        beat: u32,
        tempo: f64,
    },
    /// Emitted on every track mutation (create/update/remove).
    TrackUpdated(TrackId),
    /// Emitted for every scheduled metronome click.
    MetronomeTick { bar: u32, beat: u32, time: f64 },
    /// Any caught exception from a scheduled callback or node operation.
    Error(EngineError),
}

impl EngineEvent {
    /// Stable dotted event name (`transport:state`, `transport:position`,
    /// `track:updated`, `metronome:tick`, `engine:error`).
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TransportState(_) => "transport:state",
            EngineEvent::TransportPosition { .. } => "transport:position",
            EngineEvent::TrackUpdated(_) => "track:updated",
            EngineEvent::MetronomeTick { .. } => "metronome:tick",
            EngineEvent::Error(_) => "engine:error",
        }
    }
}

type Handler = Box<dyn FnMut(&EngineEvent) + Send>;

/// A subscription handle returned by `EventBus::on`. Dropping it does
/// nothing; call `unsubscribe` explicitly, mirroring the façade's
/// `on(event, handler) -> unsubscribe` contract rather than an RAII guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Slot {
    id: SubscriptionId,
    handler: Handler,
}

/// Typed `eventName -> handlers` registry with synchronous, insertion-order
/// dispatch. Handlers are called directly on the control thread; there is
/// no cross-thread queue to drain.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Slot>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe to every event. The façade itself filters by event name
    /// (`name()`) for callers that only want one kind; the bus dispatches to
    /// all registered handlers and lets them inspect `EngineEvent::name()`.
    pub fn on<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push(Slot {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler; idempotent if already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.handlers.retain(|slot| slot.id != id);
    }

    /// Dispatch synchronously to every handler in insertion order.
    pub fn emit(&mut self, event: EngineEvent) {
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("engine event: {}", event.name());
        }
        if let EngineEvent::Error(err) = &event {
            log::warn!("engine error: {}", err);
        }
        log::trace!("dispatching {} to {} handler(s)", event.name(), self.handlers.len());
        for slot in self.handlers.iter_mut() {
            (slot.handler)(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatches_in_insertion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let o1 = order.clone();
        bus.on(move |_| o1.lock().unwrap().push(1));
        let o2 = order.clone();
        bus.on(move |_| o2.lock().unwrap().push(2));

        bus.emit(EngineEvent::TrackUpdated(TrackId(0)));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stops_dispatch() {
        let count = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus.on(move |_| *c.lock().unwrap() += 1);

        bus.emit(EngineEvent::TrackUpdated(TrackId(0)));
        bus.unsubscribe(id);
        bus.unsubscribe(id);
        bus.emit(EngineEvent::TrackUpdated(TrackId(0)));

        assert_eq!(*count.lock().unwrap(), 1);
    }
}

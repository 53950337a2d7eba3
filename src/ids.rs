use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(TrackId);
id_type!(EffectId);
id_type!(SendId);
id_type!(EventId);
id_type!(ClipId);
id_type!(MidiClipId);
id_type!(MidiNoteId);

/// Monotonic id generator shared by every id kind the engine issues.
///
/// A single shared counter keeps the scheduler's `(time, id)` tie-break
/// monotonic across the engine's lifetime regardless of how many events
/// were cancelled, and avoids collisions across id kinds if they are ever
/// compared loosely (e.g. in logging).
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_track_id(&self) -> TrackId {
        TrackId(self.next_raw())
    }

    pub fn next_effect_id(&self) -> EffectId {
        EffectId(self.next_raw())
    }

    pub fn next_send_id(&self) -> SendId {
        SendId(self.next_raw())
    }

    pub fn next_event_id(&self) -> EventId {
        EventId(self.next_raw())
    }

    pub fn next_clip_id(&self) -> ClipId {
        ClipId(self.next_raw())
    }

    pub fn next_midi_clip_id(&self) -> MidiClipId {
        MidiClipId(self.next_raw())
    }

    pub fn next_midi_note_id(&self) -> MidiNoteId {
        MidiNoteId(self.next_raw())
    }
}

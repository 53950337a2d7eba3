pub mod clip;
pub mod engine;
pub mod metronome;
pub mod midi;
pub mod scheduler;
pub mod tempo;
pub mod track;
pub mod transport;

pub use clip::{AudioClipPlacement, BufferHandle, ClipScheduler, PendingClipStart};
pub use engine::{AudioEngine, EffectTarget, TrackConfig, TrackUpdate};
pub use metronome::{Metronome, MetronomeTick};
pub use midi::{Articulation, Instrument, MidiClip, MidiNote, MidiScheduler};
pub use scheduler::{LookaheadScheduler, SchedulerCallback};
pub use tempo::{TempoMap, TimeSignature};
pub use track::{Track, TrackKind};
pub use transport::{Transport, TransportPhase, TransportSnapshot};

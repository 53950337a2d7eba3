//! Real-time audio core for a DAW: musical-time transport, a lookahead
//! scheduler, clip/MIDI dispatch, and a routing graph with gain/pan/sends/
//! effects/metronome/cue bus, all driven through a host-agnostic
//! `AudioGraphHost` rather than owning a DSP engine of its own.
//!
//! The host runtime is a trait boundary, so this crate never touches a
//! sound card or a codec directly — it only arms node-graph primitives the
//! host implements.

pub mod audio;
pub mod command;
pub mod effects;
pub mod error;
pub mod events;
pub mod host;
pub mod ids;

pub use audio::{AudioEngine, EffectTarget, Track, TrackConfig, TrackKind, TrackUpdate, Transport};
pub use command::{ArrangementStore, EngineCommand};
pub use effects::{Effect, EffectChain, EffectKind};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus, SubscriptionId};
pub use host::{AudioGraphHost, NodeId, NodeKind};
pub use ids::{ClipId, EffectId, EventId, MidiClipId, MidiNoteId, SendId, TrackId};

//! The boundary between this crate and whatever real-time audio runtime
//! backs it. The engine drives node creation, wiring, and parameters
//! entirely through the `AudioGraphHost` trait, so it never owns a sound
//! card or DSP engine itself.

mod simulated;

pub use simulated::SimulatedHost;

use petgraph::stable_graph::NodeIndex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a node in the host's graph. A thin wrapper around
/// `petgraph::NodeIndex` so it remains valid after sibling nodes are
/// removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) NodeIndex);

/// The kind of primitive the host was asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Gain,
    Pan,
    Biquad,
    Delay,
    Waveshaper,
    Convolver,
    BufferSource,
    ChannelSplitter,
    ChannelMerger,
    Analyser,
    /// A dynamics-compressor primitive, so `Effect::Compressor` can stay a
    /// thin node wrapper rather than growing per-sample gain-reduction math
    /// of its own.
    Compressor,
}

/// Parameter target on a node, identified by name.
pub type ParamName = &'static str;

/// Capability surface of the host audio runtime. The engine writes only
/// through these primitives and never touches raw sample buffers (the one
/// documented exception, metronome click generation, fills a small buffer
/// handed to `create_buffer_source`).
pub trait AudioGraphHost: Send {
    fn current_time(&self) -> f64;
    fn sample_rate(&self) -> f64;

    fn create_node(&mut self, kind: NodeKind) -> NodeId;
    fn connect(&mut self, from: NodeId, to: NodeId);
    fn disconnect(&mut self, from: NodeId, to: NodeId);
    fn disconnect_all(&mut self, node: NodeId);
    fn dispose(&mut self, node: NodeId);

    fn set_param(&mut self, node: NodeId, param: ParamName, value: f64);
    fn get_param(&self, node: NodeId, param: ParamName) -> f64;

    /// Uploads decoded PCM samples into a `BufferSource` node ahead of
    /// `start_buffer`. The one place this crate touches raw sample data
    /// itself: generating the metronome's ~20ms click envelope.
    fn load_buffer(&mut self, node: NodeId, samples: &[f32]);

    /// Arms a buffer-source-like node to start at `context_time`, playing
    /// `offset..offset+duration` of its buffer (or its whole buffer if
    /// `duration` is `None`).
    fn start_buffer(&mut self, node: NodeId, context_time: f64, offset: f64, duration: Option<f64>);
    /// Stops a started source immediately.
    fn stop(&mut self, node: NodeId, at: f64);

    /// `resume`/`suspend` may be asynchronous the first time due to
    /// user-gesture policies on real runtimes; the trait models them as
    /// synchronous and lets the caller decide how to await them.
    fn resume(&mut self) -> bool;
    fn suspend(&mut self) -> bool;
    fn close(&mut self);
}

/// Bit-packs an `f64` clock value into an `AtomicU64` so it can be
/// published across threads without a lock. The host runtime (not this
/// crate) is responsible for advancing it.
#[derive(Debug, Clone)]
pub struct HostClock {
    bits: Arc<AtomicU64>,
}

impl HostClock {
    pub fn new(initial: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(initial.to_bits())),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, delta_seconds: f64) {
        self.set(self.get() + delta_seconds);
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

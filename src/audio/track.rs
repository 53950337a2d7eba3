use crate::effects::EffectChain;
use crate::host::{AudioGraphHost, NodeId, NodeKind};
use crate::ids::{SendId, TrackId};
use std::collections::HashMap;

/// The kind of content a track carries. `Instrument` tracks behave like
/// `Midi` tracks, but the engine owns the `Instrument` handle itself rather
/// than an external caller attaching one per note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Midi,
    Instrument,
}

/// Per-track subgraph: gain -> pan -> effect chain -> master send + cue
/// send. Mixing happens in the host runtime; this struct only owns the
/// node handles and the mute/solo/gain bookkeeping around them.
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    pub name: String,
    base_volume: f64,
    pan: f64,
    pub muted: bool,
    pub solo: bool,
    cue_level: f64,
    sends: HashMap<SendId, (NodeId, f64)>,

    input_node: NodeId,
    pan_node: Option<NodeId>,
    gain_node: NodeId,
    cue_send_gain: NodeId,

    pub effects: EffectChain,
    active_sources: Vec<NodeId>,
}

impl Track {
    /// Wires `input -> pan -> gain -> chain.input`, `chain.output ->
    /// master_bus`, and `chain.output -> cue_send_gain -> cue_bus`.
    /// Per-send gains are added lazily by `set_send_level`.
    pub fn new(
        host: &mut dyn AudioGraphHost,
        id: TrackId,
        kind: TrackKind,
        name: impl Into<String>,
        master_bus: NodeId,
        cue_bus: NodeId,
    ) -> Self {
        let input_node = host.create_node(NodeKind::Gain);
        let pan_node = host.create_node(NodeKind::Pan);
        let gain_node = host.create_node(NodeKind::Gain);
        let cue_send_gain = host.create_node(NodeKind::Gain);
        let effects = EffectChain::new(host);

        host.set_param(input_node, "gain", 1.0);
        host.set_param(pan_node, "pan", 0.0);
        host.set_param(gain_node, "gain", 1.0);
        host.set_param(cue_send_gain, "gain", 0.0);

        // Pan applied exactly once, ahead of the gain node, never
        // re-applied further down the chain.
        host.connect(input_node, pan_node);
        host.connect(pan_node, gain_node);
        host.connect(gain_node, effects.input_node());
        host.connect(effects.output_node(), master_bus);
        host.connect(effects.output_node(), cue_send_gain);
        host.connect(cue_send_gain, cue_bus);

        log::debug!("track {} created ({:?})", id, kind);
        Self {
            id,
            kind,
            name: name.into(),
            base_volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            cue_level: 0.0,
            sends: HashMap::new(),
            input_node,
            pan_node: Some(pan_node),
            gain_node,
            cue_send_gain,
            effects,
            active_sources: Vec::new(),
        }
    }

    pub fn input_node(&self) -> NodeId {
        self.input_node
    }

    pub fn base_volume(&self) -> f64 {
        self.base_volume
    }

    pub fn set_base_volume(&mut self, volume: f64) {
        self.base_volume = volume.max(0.0);
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn set_pan(&mut self, host: &mut dyn AudioGraphHost, pan: f64) {
        self.pan = pan.clamp(-1.0, 1.0);
        if let Some(node) = self.pan_node {
            host.set_param(node, "pan", self.pan);
        }
    }

    pub fn cue_level(&self) -> f64 {
        self.cue_level
    }

    pub fn set_cue_level(&mut self, host: &mut dyn AudioGraphHost, level: f64) {
        self.cue_level = level.max(0.0);
        host.set_param(self.cue_send_gain, "gain", self.cue_level);
    }

    /// `effectiveGain(track) = anySolo ? (track.solo ? baseVolume : 0) :
    /// (muted ? 0 : baseVolume)`. `any_solo` is computed once across the
    /// whole track map by the façade and passed in here, since mute/solo is
    /// cross-track state no single `Track` can resolve alone.
    pub fn apply_effective_gain(&self, host: &mut dyn AudioGraphHost, any_solo: bool) {
        let gain = self.effective_gain(any_solo);
        host.set_param(self.gain_node, "gain", gain);
    }

    pub fn effective_gain(&self, any_solo: bool) -> f64 {
        if any_solo {
            if self.solo {
                self.base_volume
            } else {
                0.0
            }
        } else if self.muted {
            0.0
        } else {
            self.base_volume
        }
    }

    /// `setSendLevel(sendId, busGain, amount)`: creates the track's
    /// per-send gain node on first use, otherwise just updates its level
    /// and (re-)connects it to `bus` in case the caller repointed the send.
    pub fn set_send_level(
        &mut self,
        host: &mut dyn AudioGraphHost,
        send_id: SendId,
        bus: NodeId,
        amount: f64,
    ) {
        let amount = amount.max(0.0);
        if let Some((node, level)) = self.sends.get_mut(&send_id) {
            *level = amount;
            host.set_param(*node, "gain", amount);
            host.connect(*node, bus);
        } else {
            let node = host.create_node(NodeKind::Gain);
            host.set_param(node, "gain", amount);
            host.connect(self.input_node, node);
            host.connect(node, bus);
            self.sends.insert(send_id, (node, amount));
            log::trace!("track {} created send {:?}", self.id, send_id);
        }
    }

    pub fn send_level(&self, send_id: SendId) -> Option<f64> {
        self.sends.get(&send_id).map(|(_, level)| *level)
    }

    pub fn remove_send(&mut self, host: &mut dyn AudioGraphHost, send_id: SendId) {
        if let Some((node, _)) = self.sends.remove(&send_id) {
            host.dispose(node);
        }
    }

    /// Creates a buffer source, configures loop bounds and playback rate,
    /// connects it to `pan` (or `gain` directly if the track has no pan
    /// node), and arms it via `start(contextTime, offset, duration)`. The
    /// source is retained in `active_sources` until `end_source`/`stop_all`
    /// removes it so `stop_all` can cancel anything still playing.
    pub fn schedule_clip(
        &mut self,
        host: &mut dyn AudioGraphHost,
        context_time: f64,
        offset_seconds: f64,
        duration_seconds: f64,
        loop_enabled: bool,
        playback_rate: f64,
    ) -> NodeId {
        let source = host.create_node(NodeKind::BufferSource);
        host.set_param(source, "playback_rate", playback_rate);
        if loop_enabled {
            host.set_param(source, "loop_start", offset_seconds);
            host.set_param(source, "loop_end", offset_seconds + duration_seconds);
            host.set_param(source, "loop", 1.0);
        }

        let entry_point = self.pan_node.unwrap_or(self.gain_node);
        host.connect(source, entry_point);
        host.start_buffer(source, context_time, offset_seconds, Some(duration_seconds));
        self.active_sources.push(source);
        source
    }

    /// Removes an ended source from `active_sources` without stopping it
    /// again — the host's `onended`-equivalent callback path.
    pub fn end_source(&mut self, source: NodeId) {
        self.active_sources.retain(|s| *s != source);
    }

    /// Cancels every active source immediately.
    pub fn stop_all(&mut self, host: &mut dyn AudioGraphHost) {
        let now = host.current_time();
        if !self.active_sources.is_empty() {
            log::trace!("track {} stopping {} active source(s)", self.id, self.active_sources.len());
        }
        for source in self.active_sources.drain(..) {
            host.stop(source, now);
            host.dispose(source);
        }
    }

    pub fn active_source_count(&self) -> usize {
        self.active_sources.len()
    }

    pub fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        log::debug!("track {} disposed", self.id);
        self.stop_all(host);
        self.effects.dispose(host);
        for (node, _) in self.sends.drain() {
            host.dispose(node);
        }
        if let Some(node) = self.pan_node.take() {
            host.dispose(node);
        }
        host.dispose(self.gain_node);
        host.dispose(self.cue_send_gain);
        host.dispose(self.input_node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    fn make_track(host: &mut SimulatedHost) -> Track {
        let master = host.create_node(NodeKind::Gain);
        let cue = host.create_node(NodeKind::Gain);
        Track::new(host, TrackId(1), TrackKind::Audio, "track", master, cue)
    }

    #[test]
    fn mute_while_solo_zeroes_non_solo_tracks() {
        let mut host = SimulatedHost::new(48_000.0);
        let mut a = make_track(&mut host);
        a.set_base_volume(1.0);
        let mut b = make_track(&mut host);
        b.set_base_volume(1.0);
        b.solo = true;

        assert_eq!(a.effective_gain(true), 0.0);
        assert_eq!(b.effective_gain(true), 1.0);

        b.solo = false;
        assert_eq!(a.effective_gain(false), 1.0);
        assert_eq!(b.effective_gain(false), 1.0);
    }

    #[test]
    fn stop_all_empties_active_sources() {
        let mut host = SimulatedHost::new(48_000.0);
        let mut track = make_track(&mut host);
        track.schedule_clip(&mut host, 0.0, 0.0, 1.0, false, 1.0);
        track.schedule_clip(&mut host, 0.5, 0.0, 1.0, false, 1.0);
        assert_eq!(track.active_source_count(), 2);

        track.stop_all(&mut host);
        assert_eq!(track.active_source_count(), 0);
    }

    #[test]
    fn pan_applied_once() {
        let mut host = SimulatedHost::new(48_000.0);
        let mut track = make_track(&mut host);
        track.set_pan(&mut host, 0.5);
        assert_eq!(host.get_param(track.pan_node.unwrap(), "pan"), 0.5);
    }
}

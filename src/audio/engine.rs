use crate::audio::clip::{AudioClipPlacement, ClipScheduler};
use crate::audio::metronome::Metronome;
use crate::audio::midi::{Instrument, MidiClip, MidiScheduler};
use crate::audio::scheduler::LookaheadScheduler;
use crate::audio::tempo::{seconds_to_beats, TimeSignature};
use crate::audio::track::{Track, TrackKind};
use crate::audio::transport::{Transport, TransportSnapshot};
use crate::effects::{EffectChain, EffectKind};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus, SubscriptionId};
use crate::host::{AudioGraphHost, NodeId, NodeKind};
use crate::ids::{EffectId, IdGenerator, MidiClipId, SendId, TrackId};
use std::collections::HashMap;
use std::sync::Arc;

/// `createTrack(config)` input, per spec §4.8.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub name: String,
    pub kind: TrackKind,
    pub base_volume: f64,
    pub pan: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: TrackKind::Audio,
            base_volume: 1.0,
            pan: 0.0,
        }
    }
}

/// `updateTrack(id, partial)` input; every field is optional so callers
/// only touch what changed.
#[derive(Debug, Clone, Default)]
pub struct TrackUpdate {
    pub base_volume: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
    pub solo: Option<bool>,
    pub cue_level: Option<f64>,
}

/// Where an effect-chain operation applies: the master bus or a track's
/// own chain, per spec §4.8 ("add/remove/move/bypass on master or per
/// track").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Master,
    Track(TrackId),
}

/// Holds the consumer's `ArrangementStore`, polled once per `tick()`. See
/// `command.rs` for `attach_store`/`drain_store`/`apply_command`.
pub(crate) struct StoreSlot {
    pub(crate) store: Box<dyn crate::command::ArrangementStore>,
}

/// Owns every subsystem in spec §2 and exposes the public contract of
/// spec §4.8: transport transitions, track/effect management, clip and
/// MIDI scheduling, and the event bus.
///
/// Grounded on the teacher's `Engine`/`EngineController` pair
/// (`audio/engine.rs`): that struct owned the project, audio pool, and
/// rtrb command/event channels driven from a cpal callback. Here the
/// façade owns the same subsystems conceptually (tracks, transport,
/// scheduler, metronome) but talks to them through direct method calls on
/// the control thread, per spec §5's single-threaded cooperative model,
/// with `AudioGraphHost` standing in for the cpal-driven DSP graph.
pub struct AudioEngine {
    host: Box<dyn AudioGraphHost>,
    ids: Arc<IdGenerator>,
    event_bus: EventBus,

    transport: Transport,
    scheduler: LookaheadScheduler,
    metronome: Metronome,
    clip_scheduler: ClipScheduler,
    midi_scheduler: MidiScheduler,

    tracks: HashMap<TrackId, Track>,
    instruments: HashMap<TrackId, Box<dyn Instrument>>,

    audio_clips: Vec<AudioClipPlacement>,
    midi_clips: HashMap<MidiClipId, (TrackId, MidiClip)>,

    master_chain: EffectChain,
    master_sum: NodeId,
    cue_bus: NodeId,
    metronome_bus: NodeId,
    sends: HashMap<SendId, NodeId>,

    pub(crate) store: Option<StoreSlot>,

    position_update_interval: f64,
    last_position_emit: f64,
    last_window_end: f64,
    disposed: bool,
}

impl AudioEngine {
    pub fn new(mut host: Box<dyn AudioGraphHost>, tempo: f64, time_signature: TimeSignature) -> Self {
        let master_sum = host.create_node(NodeKind::Gain);
        let cue_bus = host.create_node(NodeKind::Gain);
        let metronome_bus = host.create_node(NodeKind::Gain);
        host.set_param(master_sum, "gain", 1.0);
        host.set_param(cue_bus, "gain", 1.0);
        host.set_param(metronome_bus, "gain", 1.0);

        let master_chain = EffectChain::new(&mut *host);
        host.connect(master_sum, master_chain.input_node());
        host.connect(metronome_bus, master_sum);

        let metronome = Metronome::new(&mut *host, metronome_bus);
        let now = host.current_time();
        let ids = Arc::new(IdGenerator::new());

        Self {
            host,
            ids: ids.clone(),
            event_bus: EventBus::new(),
            transport: Transport::new(tempo, time_signature),
            scheduler: LookaheadScheduler::new(),
            metronome,
            clip_scheduler: ClipScheduler::new(),
            midi_scheduler: MidiScheduler::new(ids),
            tracks: HashMap::new(),
            instruments: HashMap::new(),
            audio_clips: Vec::new(),
            midi_clips: HashMap::new(),
            master_chain,
            master_sum,
            cue_bus,
            metronome_bus,
            sends: HashMap::new(),
            store: None,
            position_update_interval: 0.05,
            last_position_emit: now,
            last_window_end: now,
            disposed: false,
        }
    }

    fn ensure_alive(&self) -> EngineResult<()> {
        if self.disposed {
            Err(EngineError::lifecycle("operation attempted on a disposed engine"))
        } else {
            Ok(())
        }
    }

    fn surface_errors(&mut self, errors: Vec<EngineError>) {
        for err in errors {
            self.event_bus.emit(EngineEvent::Error(err));
        }
    }

    /// Lets `command.rs` publish onto the same bus without exposing
    /// `event_bus` itself across the module boundary.
    pub(crate) fn emit_error_event(&mut self, event: EngineEvent) {
        self.event_bus.emit(event);
    }

    fn emit_transport_state(&mut self, now: f64) {
        let snapshot = self.transport.snapshot(now);
        self.event_bus.emit(EngineEvent::TransportState(snapshot));
    }

    fn emit_position(&mut self, now: f64) {
        let TransportSnapshot {
            position_seconds,
            bar,
            beat,
            tempo,
            ..
        } = self.transport.snapshot(now);
        self.event_bus.emit(EngineEvent::TransportPosition {
            context_time: now,
            position_seconds,
            bar,
            beat,
            tempo,
        });
    }

    fn rearm_clips_at(&mut self, beat: f64, now: f64) {
        let tempo = self.transport.tempo();
        self.clip_scheduler.arm(&self.audio_clips, beat, now, tempo);
    }

    fn rearm_from_current_position(&mut self, now: f64) {
        let beat = seconds_to_beats(self.transport.position(now), self.transport.tempo());
        self.rearm_clips_at(beat, now);
    }

    /// Recomputes every armed MIDI note from `midi_clips` under the
    /// current tempo and beat-zero anchor. Called whenever either changes
    /// underneath already-scheduled clips (play, seek, tempo change, loop
    /// wrap), since `MidiScheduler` only stores absolute context times.
    fn rearm_midi(&mut self, now: f64) {
        self.midi_scheduler.clear_all();
        let anchor = self.transport.beat_zero_context_time(now);
        let tempo = self.transport.tempo();
        for (track_id, clip) in self.midi_clips.values() {
            self.midi_scheduler.schedule_clip(*track_id, clip, anchor, tempo);
        }
    }

    fn recompute_gains(&mut self) {
        let any_solo = self.tracks.values().any(|t| t.solo);
        for track in self.tracks.values() {
            track.apply_effective_gain(&mut *self.host, any_solo);
        }
    }

    // -- Transport -----------------------------------------------------

    /// `Stopped/Paused -> Playing`. Tries `host.resume()` first; on
    /// failure the transport stays put and the error is both returned and
    /// emitted as `engine:error`, per spec §4.3's failure mode.
    pub fn play(&mut self) -> EngineResult<()> {
        self.ensure_alive()?;
        let now = self.host.current_time();
        let resume_ok = self.host.resume();
        if let Err(err) = self.transport.play(now, resume_ok) {
            self.event_bus.emit(EngineEvent::Error(err.clone()));
            return Err(err);
        }

        self.scheduler.start();
        self.last_window_end = now;
        self.rearm_from_current_position(now);
        self.rearm_midi(now);
        let seconds_per_beat = 60.0 / self.transport.tempo();
        self.metronome.reset(now, self.transport.position(now), seconds_per_beat);
        self.emit_transport_state(now);
        Ok(())
    }

    /// `Playing -> Paused`.
    pub fn pause(&mut self) -> EngineResult<()> {
        self.ensure_alive()?;
        let now = self.host.current_time();
        self.host.suspend();
        self.transport.pause(now);
        self.scheduler.stop();
        self.emit_transport_state(now);
        Ok(())
    }

    /// Any phase `-> Stopped`: resets position, stops every track's active
    /// sources, and cancels the metronome/clip scheduling horizon.
    pub fn stop(&mut self) -> EngineResult<()> {
        self.ensure_alive()?;
        self.transport.stop();
        self.scheduler.stop();
        self.clip_scheduler.clear();
        for track in self.tracks.values_mut() {
            track.stop_all(&mut *self.host);
        }
        let now = self.host.current_time();
        self.emit_transport_state(now);
        Ok(())
    }

    pub fn seek(&mut self, position_seconds: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        let now = self.host.current_time();
        self.transport.seek(now, position_seconds);
        self.last_window_end = now;
        self.rearm_from_current_position(now);
        self.rearm_midi(now);
        let seconds_per_beat = 60.0 / self.transport.tempo();
        self.metronome.reset(now, self.transport.position(now), seconds_per_beat);
        self.emit_transport_state(now);
        Ok(())
    }

    pub fn set_tempo(&mut self, bpm: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        self.transport.set_tempo(bpm);
        let now = self.host.current_time();
        let seconds_per_beat = 60.0 / bpm;
        self.metronome.reset(now, self.transport.position(now), seconds_per_beat);
        self.rearm_from_current_position(now);
        self.rearm_midi(now);
        self.emit_transport_state(now);
        Ok(())
    }

    pub fn set_loop(&mut self, on: bool, start: Option<f64>, end: Option<f64>) -> EngineResult<()> {
        self.ensure_alive()?;
        self.transport.set_loop(on, start, end);
        let now = self.host.current_time();
        self.emit_transport_state(now);
        Ok(())
    }

    pub fn transport_snapshot(&self) -> TransportSnapshot {
        self.transport.snapshot(self.host.current_time())
    }

    pub fn enable_metronome(&mut self, enabled: bool) {
        self.metronome.set_enabled(enabled);
    }

    pub fn set_metronome_level(&mut self, level: f64) {
        self.host.set_param(self.metronome_bus, "gain", level.max(0.0));
    }

    // -- Scheduler pass-through ------------------------------------------

    pub fn schedule(&mut self, time: f64, callback: crate::audio::scheduler::SchedulerCallback) -> crate::ids::EventId {
        self.scheduler.schedule(time, callback)
    }

    pub fn cancel_scheduled(&mut self, id: crate::ids::EventId) {
        self.scheduler.cancel(id);
    }

    // -- Tracks ----------------------------------------------------------

    pub fn create_track(&mut self, config: TrackConfig) -> EngineResult<TrackId> {
        self.ensure_alive()?;
        let id = self.ids.next_track_id();
        let mut track = Track::new(&mut *self.host, id, config.kind, config.name, self.master_sum, self.cue_bus);
        track.set_base_volume(config.base_volume);
        track.set_pan(&mut *self.host, config.pan);
        self.tracks.insert(id, track);
        self.recompute_gains();
        self.event_bus.emit(EngineEvent::TrackUpdated(id));
        Ok(id)
    }

    /// No-op on an unknown track id, per spec §4.8's failure semantics.
    pub fn update_track(&mut self, id: TrackId, update: TrackUpdate) {
        if self.disposed {
            return;
        }
        let Some(track) = self.tracks.get_mut(&id) else {
            return;
        };
        if let Some(volume) = update.base_volume {
            track.set_base_volume(volume);
        }
        if let Some(pan) = update.pan {
            track.set_pan(&mut *self.host, pan);
        }
        if let Some(muted) = update.muted {
            track.muted = muted;
        }
        if let Some(solo) = update.solo {
            track.solo = solo;
        }
        if let Some(cue_level) = update.cue_level {
            track.set_cue_level(&mut *self.host, cue_level);
        }
        self.recompute_gains();
        self.event_bus.emit(EngineEvent::TrackUpdated(id));
    }

    /// Calls `stopAll` synchronously before tearing the track's nodes
    /// down, per spec §4.8. No-op if `id` is unknown.
    pub fn remove_track(&mut self, id: TrackId) {
        if self.disposed {
            return;
        }
        if let Some(mut track) = self.tracks.remove(&id) {
            track.stop_all(&mut *self.host);
            track.dispose(&mut *self.host);
            self.midi_scheduler.clear_track(id);
            self.instruments.remove(&id);
            self.recompute_gains();
            self.event_bus.emit(EngineEvent::TrackUpdated(id));
        }
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.keys().copied().collect()
    }

    pub fn create_send(&mut self) -> SendId {
        let id = self.ids.next_send_id();
        let bus = self.host.create_node(NodeKind::Gain);
        self.host.set_param(bus, "gain", 1.0);
        self.host.connect(bus, self.master_sum);
        self.sends.insert(id, bus);
        id
    }

    pub fn set_send_level(&mut self, track_id: TrackId, send_id: SendId, amount: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        let bus = *self
            .sends
            .get(&send_id)
            .ok_or_else(|| EngineError::configuration(format!("unknown send id {send_id}")))?;
        let host = &mut *self.host;
        let track = self
            .tracks
            .get_mut(&track_id)
            .ok_or_else(|| EngineError::configuration(format!("unknown track id {track_id}")))?;
        track.set_send_level(host, send_id, bus, amount);
        self.event_bus.emit(EngineEvent::TrackUpdated(track_id));
        Ok(())
    }

    // -- Audio clip scheduling -------------------------------------------

    /// Arms `placement` against the current play position if playing, and
    /// files it for future arming otherwise (e.g. arranging before play).
    /// Fails with a "track not found" `Configuration` error for an unknown
    /// track, per spec §4.8.
    pub fn schedule_clip(&mut self, placement: AudioClipPlacement) -> EngineResult<()> {
        self.ensure_alive()?;
        if !self.tracks.contains_key(&placement.track_id) {
            return Err(EngineError::configuration(format!(
                "track not found: {}",
                placement.track_id
            )));
        }
        self.audio_clips.push(placement);
        if self.transport.is_playing() {
            let now = self.host.current_time();
            self.rearm_from_current_position(now);
        }
        Ok(())
    }

    // -- MIDI scheduling ---------------------------------------------------

    pub fn schedule_midi_clip(&mut self, track_id: TrackId, clip: MidiClip) -> EngineResult<()> {
        self.ensure_alive()?;
        if !self.tracks.contains_key(&track_id) {
            return Err(EngineError::configuration(format!("track not found: {track_id}")));
        }
        self.midi_clips.insert(clip.id, (track_id, clip));
        let now = self.host.current_time();
        self.rearm_midi(now);
        Ok(())
    }

    pub fn unschedule_midi_clip(&mut self, clip_id: MidiClipId) {
        if self.disposed {
            return;
        }
        self.midi_clips.remove(&clip_id);
        let now = self.host.current_time();
        self.rearm_midi(now);
    }

    pub fn clear_all_midi(&mut self) {
        if self.disposed {
            return;
        }
        self.midi_clips.clear();
        self.midi_scheduler.clear_all();
    }

    pub fn attach_instrument(&mut self, track_id: TrackId, instrument: Box<dyn Instrument>) -> EngineResult<()> {
        self.ensure_alive()?;
        if !self.tracks.contains_key(&track_id) {
            return Err(EngineError::configuration(format!("track not found: {track_id}")));
        }
        self.instruments.insert(track_id, instrument);
        Ok(())
    }

    pub fn detach_instrument(&mut self, track_id: TrackId) {
        if let Some(mut instrument) = self.instruments.remove(&track_id) {
            instrument.dispose();
        }
    }

    /// `previewNote(trackId, pitch, velocity=100)` for piano-roll
    /// interaction, per spec §4.7.
    pub fn preview_note(&mut self, track_id: TrackId, pitch: u8, velocity: Option<u8>) -> EngineResult<()> {
        self.ensure_alive()?;
        if !self.tracks.contains_key(&track_id) {
            return Err(EngineError::configuration(format!("track not found: {track_id}")));
        }
        let now = self.host.current_time();
        self.midi_scheduler.preview_note(track_id, pitch, velocity.unwrap_or(100), now);
        Ok(())
    }

    // -- Effects -----------------------------------------------------------

    pub fn add_effect(&mut self, target: EffectTarget, kind: EffectKind, index: Option<usize>) -> EngineResult<EffectId> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        Ok(chain.create_effect(&mut *self.host, &self.ids, kind, index))
    }

    pub fn remove_effect(&mut self, target: EffectTarget, id: EffectId) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        chain.remove_effect(&mut *self.host, id)
    }

    pub fn move_effect(&mut self, target: EffectTarget, id: EffectId, new_index: usize) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        chain.move_effect(&mut *self.host, id, new_index)
    }

    /// Resolves which chain an effect operation targets. A free function
    /// taking disjoint field borrows directly, rather than a `&mut self`
    /// method, since every caller also needs `&mut self.host` alongside the
    /// chain it returns.
    fn chain_for<'a>(tracks: &'a mut HashMap<TrackId, Track>, master: &'a mut EffectChain, target: EffectTarget) -> EngineResult<&'a mut EffectChain> {
        match target {
            EffectTarget::Master => Ok(master),
            EffectTarget::Track(track_id) => tracks
                .get_mut(&track_id)
                .map(|t| &mut t.effects)
                .ok_or_else(|| EngineError::configuration(format!("unknown track id {track_id}"))),
        }
    }

    pub fn set_effect_parameter(&mut self, target: EffectTarget, id: EffectId, param: &str, value: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        let effect = chain
            .get_mut(id)
            .ok_or_else(|| EngineError::configuration(format!("unknown effect id {id}")))?;
        effect.set_parameter(&mut *self.host, param, value);
        Ok(())
    }

    pub fn set_effect_enabled(&mut self, target: EffectTarget, id: EffectId, enabled: bool) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        let effect = chain
            .get_mut(id)
            .ok_or_else(|| EngineError::configuration(format!("unknown effect id {id}")))?;
        effect.set_enabled(&mut *self.host, enabled);
        Ok(())
    }

    /// `bypass`: shorthand for disabling an effect without removing it.
    pub fn bypass_effect(&mut self, target: EffectTarget, id: EffectId) -> EngineResult<()> {
        self.set_effect_enabled(target, id, false)
    }

    pub fn set_effect_mix(&mut self, target: EffectTarget, id: EffectId, wet: f64, dry: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        let effect = chain
            .get_mut(id)
            .ok_or_else(|| EngineError::configuration(format!("unknown effect id {id}")))?;
        effect.set_mix(&mut *self.host, wet, dry);
        Ok(())
    }

    pub fn set_chain_level(&mut self, target: EffectTarget, amount: f64) -> EngineResult<()> {
        self.ensure_alive()?;
        let chain = Self::chain_for(&mut self.tracks, &mut self.master_chain, target)?;
        chain.set_chain_level(&mut *self.host, amount);
        Ok(())
    }

    /// `{master, tracks: map trackId -> ChainState}` per spec §6.
    pub fn serialize_state(&self) -> serde_json::Value {
        let tracks: serde_json::Map<String, serde_json::Value> = self
            .tracks
            .iter()
            .map(|(id, track)| (id.to_string(), track.effects.serialize_state()))
            .collect();
        serde_json::json!({
            "master": self.master_chain.serialize_state(),
            "tracks": tracks,
        })
    }

    pub fn set_state(&mut self, state: &serde_json::Value) -> EngineResult<()> {
        self.ensure_alive()?;
        if let Some(master) = state.get("master") {
            self.master_chain.set_state(&mut *self.host, &self.ids, master)?;
        }
        if let Some(tracks) = state.get("tracks").and_then(|v| v.as_object()) {
            for (id_str, chain_state) in tracks {
                let id = TrackId(
                    id_str
                        .parse()
                        .map_err(|_| EngineError::configuration(format!("invalid track id {id_str}")))?,
                );
                if let Some(track) = self.tracks.get_mut(&id) {
                    track.effects.set_state(&mut *self.host, &self.ids, chain_state)?;
                }
            }
        }
        Ok(())
    }

    // -- Events ------------------------------------------------------------

    pub fn on<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.event_bus.on(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.event_bus.unsubscribe(id);
    }

    // -- Control loop --------------------------------------------------------

    /// Drives every subsystem one step: the coarse scheduler tick, clip/
    /// metronome dispatch within the lookahead horizon, MIDI note on/off,
    /// and the periodic `transport:position` event. Callers invoke this
    /// from whatever timer replaces the host's interval primitive (spec
    /// §9: "correctness depends only on 'fires at least every
    /// `intervalMs`'").
    pub fn tick(&mut self) {
        if self.disposed {
            return;
        }
        self.drain_store();

        let now = self.host.current_time();
        let horizon = now + self.scheduler.lookahead_seconds;

        let errors = self.scheduler.tick(now);
        self.surface_errors(errors);

        if self.transport.is_playing() {
            let (position, _) = self.transport.tick_position(now);
            let tempo = self.transport.tempo();
            let beat = seconds_to_beats(position, tempo);
            if self.clip_scheduler.observe_position(beat) {
                self.rearm_clips_at(beat, now);
                self.rearm_midi(now);
            }

            for start in self.clip_scheduler.due(horizon) {
                if let Some(track) = self.tracks.get_mut(&start.track_id) {
                    track.schedule_clip(
                        &mut *self.host,
                        start.context_time,
                        start.offset_seconds,
                        start.duration_seconds,
                        start.loop_enabled,
                        start.playback_rate,
                    );
                }
            }

            if self.metronome.enabled() {
                let seconds_per_beat = 60.0 / tempo;
                let time_signature = self.transport.time_signature();
                let ticks = self.metronome.schedule_beats(
                    &mut *self.host,
                    self.last_window_end,
                    horizon,
                    seconds_per_beat,
                    time_signature,
                );
                for tick in ticks {
                    self.event_bus.emit(EngineEvent::MetronomeTick {
                        bar: tick.bar,
                        beat: tick.beat,
                        time: tick.time,
                    });
                }
            }
            self.last_window_end = horizon;

            if now - self.last_position_emit >= self.position_update_interval {
                self.emit_position(now);
                self.last_position_emit = now;
            }
        }

        self.midi_scheduler.process(now, &mut self.instruments);
    }

    /// Tears down every owned node on all exit paths (spec §5): stops
    /// active sources, disposes every track and its effect chain, disposes
    /// the master chain and buses, and closes the host context. All
    /// methods besides observation (`transport_snapshot`, `serialize_state`)
    /// become no-ops/`Lifecycle` errors afterward.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.transport.stop();
        self.scheduler.stop();
        self.scheduler.clear();
        self.clip_scheduler.clear();
        self.midi_scheduler.clear_all();

        for (_, mut track) in self.tracks.drain() {
            track.dispose(&mut *self.host);
        }
        for (_, mut instrument) in self.instruments.drain() {
            instrument.dispose();
        }
        self.master_chain.dispose(&mut *self.host);
        for (_, node) in self.sends.drain() {
            self.host.dispose(node);
        }
        self.host.dispose(self.master_sum);
        self.host.dispose(self.cue_bus);
        self.host.dispose(self.metronome_bus);
        self.host.close();
        self.disposed = true;
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    fn new_engine() -> AudioEngine {
        AudioEngine::new(Box::new(SimulatedHost::new(48_000.0)), 120.0, TimeSignature::default())
    }

    #[test]
    fn play_from_bar_two_starts_clip_with_correct_offset() {
        let mut engine = new_engine();
        let track_id = engine.create_track(TrackConfig::default()).unwrap();
        engine
            .schedule_clip(AudioClipPlacement {
                id: crate::ids::ClipId(0),
                track_id,
                buffer: crate::audio::clip::BufferHandle {
                    id: 0,
                    duration_seconds: 2.0,
                },
                start_beat: 0.0,
                duration_beats: 4.0,
                offset_seconds: 0.0,
                loop_enabled: false,
                playback_rate: 1.0,
            })
            .unwrap();

        engine.seek(1.0).unwrap(); // beat 2 at 120 BPM
        engine.play().unwrap();
        engine.tick();

        let snapshot = engine.transport_snapshot();
        assert_eq!((snapshot.bar, snapshot.beat), (1, 3));
    }

    #[test]
    fn solo_isolates_track() {
        let mut engine = new_engine();
        let a = engine.create_track(TrackConfig::default()).unwrap();
        let b = engine.create_track(TrackConfig::default()).unwrap();
        let c = engine.create_track(TrackConfig::default()).unwrap();

        engine.update_track(
            b,
            TrackUpdate {
                solo: Some(true),
                ..Default::default()
            },
        );

        assert_eq!(engine.tracks.get(&a).unwrap().effective_gain(true), 0.0);
        assert_eq!(engine.tracks.get(&b).unwrap().effective_gain(true), 1.0);
        assert_eq!(engine.tracks.get(&c).unwrap().effective_gain(true), 0.0);

        engine.update_track(
            b,
            TrackUpdate {
                solo: Some(false),
                ..Default::default()
            },
        );
        for id in [a, b, c] {
            assert_eq!(engine.tracks.get(&id).unwrap().effective_gain(false), 1.0);
        }
    }

    #[test]
    fn stop_resets_transport_and_clears_sources() {
        let mut engine = new_engine();
        let track_id = engine.create_track(TrackConfig::default()).unwrap();
        engine.play().unwrap();
        engine
            .schedule_clip(AudioClipPlacement {
                id: crate::ids::ClipId(0),
                track_id,
                buffer: crate::audio::clip::BufferHandle {
                    id: 0,
                    duration_seconds: 5.0,
                },
                start_beat: 0.0,
                duration_beats: 4.0,
                offset_seconds: 0.0,
                loop_enabled: false,
                playback_rate: 1.0,
            })
            .unwrap();
        engine.tick();

        engine.stop().unwrap();

        let snapshot = engine.transport_snapshot();
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.position_seconds, 0.0);
        assert_eq!(engine.tracks.get(&track_id).unwrap().active_source_count(), 0);
    }

    #[test]
    fn schedule_clip_on_unknown_track_fails() {
        let mut engine = new_engine();
        let err = engine
            .schedule_clip(AudioClipPlacement {
                id: crate::ids::ClipId(0),
                track_id: TrackId(999),
                buffer: crate::audio::clip::BufferHandle {
                    id: 0,
                    duration_seconds: 1.0,
                },
                start_beat: 0.0,
                duration_beats: 1.0,
                offset_seconds: 0.0,
                loop_enabled: false,
                playback_rate: 1.0,
            })
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn update_track_on_unknown_id_is_noop() {
        let mut engine = new_engine();
        engine.update_track(TrackId(42), TrackUpdate::default());
    }

    #[test]
    fn effect_state_round_trips_through_engine() {
        let mut engine = new_engine();
        let reverb = engine.add_effect(EffectTarget::Master, EffectKind::Reverb, None).unwrap();
        engine
            .set_effect_parameter(EffectTarget::Master, reverb, "wet_level", 0.4)
            .unwrap();
        engine.add_effect(EffectTarget::Master, EffectKind::Delay, None).unwrap();

        let state = engine.serialize_state();
        engine.set_state(&state).unwrap();
        let round_tripped = engine.serialize_state();

        assert_eq!(state["master"]["effects"], round_tripped["master"]["effects"]);
    }

    #[test]
    fn dispose_makes_mutations_noop() {
        let mut engine = new_engine();
        engine.dispose();
        let err = engine.play().unwrap_err();
        assert_eq!(err.category(), "lifecycle");
    }
}

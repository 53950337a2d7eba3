//! Arrangement store adapter.
//!
//! The façade's primary contract is direct method calls (`engine.play()`,
//! `engine.create_track(..)`, ...); this module exists for the one caller
//! who instead wants to hand the engine an external store and have it pull
//! diffs each tick.

use crate::audio::clip::AudioClipPlacement;
use crate::audio::engine::{AudioEngine, StoreSlot, TrackConfig, TrackUpdate};
use crate::audio::midi::MidiClip;
use crate::events::EngineEvent;
use crate::ids::{MidiClipId, SendId, TrackId};

/// A diff the arrangement wants applied to the engine, translated 1:1 onto
/// a facade method in `apply_command`.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetTempo(f64),
    SetLoop(bool, Option<f64>, Option<f64>),

    CreateTrack(TrackConfig),
    UpdateTrack(TrackId, TrackUpdate),
    RemoveTrack(TrackId),
    SetSendLevel(TrackId, SendId, f64),

    ScheduleClip(AudioClipPlacement),
    ScheduleMidiClip(TrackId, MidiClip),
    UnscheduleMidiClip(MidiClipId),
    ClearAllMidi,
}

/// Implemented by the consumer's arrangement/timeline model. `poll` drains
/// whatever diffs accumulated since the last call; an empty return is the
/// common case on most ticks.
pub trait ArrangementStore: Send {
    fn poll(&mut self) -> Vec<EngineCommand>;
}

impl AudioEngine {
    /// Installs `store` as the engine's command source; replaces whatever
    /// was attached before. `tick()` polls it once per call via
    /// `drain_store`.
    pub fn attach_store(&mut self, store: impl ArrangementStore + 'static) {
        self.store = Some(StoreSlot { store: Box::new(store) });
    }

    pub fn detach_store(&mut self) {
        self.store = None;
    }

    /// Polls the attached store (if any) and applies every command it
    /// returns, in order. A command that fails emits `engine:error`
    /// instead of aborting the remaining batch, matching the failure mode
    /// every direct facade method already uses.
    pub(crate) fn drain_store(&mut self) {
        let Some(slot) = self.store.as_mut() else {
            return;
        };
        let commands = slot.store.poll();
        if !commands.is_empty() {
            log::trace!("draining {} command(s) from arrangement store", commands.len());
        }
        for command in commands {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: EngineCommand) {
        log::debug!("applying command: {:?}", command);
        let result = match command {
            EngineCommand::Play => self.play(),
            EngineCommand::Pause => self.pause(),
            EngineCommand::Stop => self.stop(),
            EngineCommand::Seek(position) => self.seek(position),
            EngineCommand::SetTempo(bpm) => self.set_tempo(bpm),
            EngineCommand::SetLoop(on, start, end) => self.set_loop(on, start, end),

            EngineCommand::CreateTrack(config) => self.create_track(config).map(|_| ()),
            EngineCommand::UpdateTrack(id, update) => {
                self.update_track(id, update);
                Ok(())
            }
            EngineCommand::RemoveTrack(id) => {
                self.remove_track(id);
                Ok(())
            }
            EngineCommand::SetSendLevel(track_id, send_id, amount) => {
                self.set_send_level(track_id, send_id, amount)
            }

            EngineCommand::ScheduleClip(placement) => self.schedule_clip(placement),
            EngineCommand::ScheduleMidiClip(track_id, clip) => self.schedule_midi_clip(track_id, clip),
            EngineCommand::UnscheduleMidiClip(clip_id) => {
                self.unschedule_midi_clip(clip_id);
                Ok(())
            }
            EngineCommand::ClearAllMidi => {
                self.clear_all_midi();
                Ok(())
            }
        };

        if let Err(err) = result {
            self.emit_command_error(err);
        }
    }

    fn emit_command_error(&mut self, err: crate::error::EngineError) {
        log::debug!("command rejected: {}", err);
        self.emit_error_event(EngineEvent::Error(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tempo::TimeSignature;
    use crate::host::SimulatedHost;
    use std::sync::{Arc, Mutex};

    struct QueueStore {
        commands: Arc<Mutex<Vec<EngineCommand>>>,
    }

    impl ArrangementStore for QueueStore {
        fn poll(&mut self) -> Vec<EngineCommand> {
            std::mem::take(&mut *self.commands.lock().unwrap())
        }
    }

    #[test]
    fn attached_store_commands_apply_on_tick() {
        let mut engine = AudioEngine::new(Box::new(SimulatedHost::new(48_000.0)), 120.0, TimeSignature::default());
        let queue = Arc::new(Mutex::new(vec![EngineCommand::CreateTrack(TrackConfig::default())]));
        engine.attach_store(QueueStore { commands: queue.clone() });

        assert!(engine.track_ids().is_empty());
        engine.tick();
        assert_eq!(engine.track_ids().len(), 1);

        // Queue drained; a second tick with nothing queued is a no-op.
        engine.tick();
        assert_eq!(engine.track_ids().len(), 1);
    }

    #[test]
    fn command_targeting_unknown_track_surfaces_as_error_event() {
        let mut engine = AudioEngine::new(Box::new(SimulatedHost::new(48_000.0)), 120.0, TimeSignature::default());
        let errors = Arc::new(Mutex::new(0));
        let e = errors.clone();
        engine.on(move |event| {
            if matches!(event, EngineEvent::Error(_)) {
                *e.lock().unwrap() += 1;
            }
        });

        let queue = Arc::new(Mutex::new(vec![EngineCommand::SetSendLevel(TrackId(999), SendId(0), 1.0)]));
        engine.attach_store(QueueStore { commands: queue });
        engine.tick();

        assert_eq!(*errors.lock().unwrap(), 1);
    }
}

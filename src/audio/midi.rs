use crate::audio::tempo::beats_to_seconds;
use crate::ids::{MidiClipId, MidiNoteId, TrackId};
use std::collections::HashMap;

/// Per-note modifier altering duration and/or velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Articulation {
    Normal,
    Staccato,
    Legato,
    Accent,
}

impl Default for Articulation {
    fn default() -> Self {
        Articulation::Normal
    }
}

/// A MIDI note within a clip: `{pitch, velocity, startTimeBeats,
/// durationBeats, articulation}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiNote {
    pub pitch: u8,
    pub velocity: u8,
    pub start_time_beats: f64,
    pub duration_beats: f64,
    pub articulation: Articulation,
}

impl MidiNote {
    pub fn new(pitch: u8, velocity: u8, start_time_beats: f64, duration_beats: f64) -> Self {
        Self {
            pitch: pitch.min(127),
            velocity: velocity.min(127),
            start_time_beats,
            duration_beats,
            articulation: Articulation::Normal,
        }
    }

    pub fn with_articulation(mut self, articulation: Articulation) -> Self {
        self.articulation = articulation;
        self
    }

    /// Applies articulation: staccato halves duration, legato stretches it
    /// by 1.2x, accent raises velocity by 20 (clamped to 127), normal
    /// leaves both unchanged.
    fn adjusted(&self) -> (f64, u8) {
        match self.articulation {
            Articulation::Staccato => (self.duration_beats * 0.5, self.velocity),
            Articulation::Legato => (self.duration_beats * 1.2, self.velocity),
            Articulation::Accent => (self.duration_beats, self.velocity.saturating_add(20).min(127)),
            Articulation::Normal => (self.duration_beats, self.velocity),
        }
    }
}

/// A MIDI clip placed on the timeline: `{clipId, notes}`.
#[derive(Debug, Clone)]
pub struct MidiClip {
    pub id: MidiClipId,
    pub start_beat: f64,
    pub notes: Vec<MidiNote>,
}

impl MidiClip {
    pub fn new(id: MidiClipId, start_beat: f64) -> Self {
        Self {
            id,
            start_beat,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: MidiNote) {
        self.notes.push(note);
    }
}

/// `instrument.noteOn(pitch, velocity, atContextTime)` /
/// `instrument.noteOff(pitch, atContextTime)`. The engine never synthesizes
/// notes itself; it only issues these commands to whatever `Instrument`
/// the arrangement attached to a track.
pub trait Instrument: Send {
    fn note_on(&mut self, pitch: u8, velocity: u8, at_context_time: f64);
    fn note_off(&mut self, pitch: u8, at_context_time: f64);
    fn dispose(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArmedNote {
    #[allow(dead_code)]
    id: MidiNoteId,
    clip_id: MidiClipId,
    pitch: u8,
    velocity: u8,
    start_time: f64,
    end_time: f64,
    armed: bool,
    released: bool,
}

/// Arms note-on/note-off pairs on a per-track `Instrument`.
///
/// Notes are precomputed into absolute `(start, end)` context times under
/// the current tempo at schedule time, and driven forward by `process`
/// calls carrying `currentTime` rather than by a sample-accurate render
/// loop.
pub struct MidiScheduler {
    notes: HashMap<TrackId, Vec<ArmedNote>>,
    ids: std::sync::Arc<crate::ids::IdGenerator>,
}

impl MidiScheduler {
    pub fn new(ids: std::sync::Arc<crate::ids::IdGenerator>) -> Self {
        Self {
            notes: HashMap::new(),
            ids,
        }
    }

    /// Precomputes `(startTimeSeconds, endTimeSeconds)` for every note in
    /// `clip` under `tempo`, anchored so that `clip.start_beat +
    /// note.start_time_beats == 0` maps to `context_time_at_clip_start`.
    pub fn schedule_clip(
        &mut self,
        track_id: TrackId,
        clip: &MidiClip,
        context_time_at_beat_zero: f64,
        tempo: f64,
    ) {
        log::debug!("scheduling midi clip {} on track {} ({} notes)", clip.id, track_id, clip.notes.len());
        let entry = self.notes.entry(track_id).or_default();
        for note in &clip.notes {
            let (adjusted_duration, adjusted_velocity) = note.adjusted();
            let start_beats = clip.start_beat + note.start_time_beats;
            let start_time = context_time_at_beat_zero + beats_to_seconds(start_beats, tempo);
            let end_time = start_time + beats_to_seconds(adjusted_duration, tempo);
            entry.push(ArmedNote {
                id: self.ids.next_midi_note_id(),
                clip_id: clip.id,
                pitch: note.pitch,
                velocity: adjusted_velocity,
                start_time,
                end_time,
                armed: false,
                released: false,
            });
        }
    }

    /// Removes every note belonging to `clip_id` from `track_id`'s armed
    /// set, whether or not it has fired yet — `unscheduleMidiClip(clipId)`
    /// at the façade level.
    pub fn unschedule_clip(&mut self, track_id: TrackId, clip_id: MidiClipId) {
        log::debug!("unscheduling midi clip {} on track {}", clip_id, track_id);
        if let Some(notes) = self.notes.get_mut(&track_id) {
            notes.retain(|n| n.clip_id != clip_id);
        }
    }

    pub fn clear_track(&mut self, track_id: TrackId) {
        self.notes.remove(&track_id);
    }

    pub fn clear_all(&mut self) {
        self.notes.clear();
    }

    /// Drives every armed note against `current_time`: fires `note_on` once
    /// `start_time <= current_time`, `note_off` once `end_time <=
    /// current_time`, and garbage-collects notes a second past `end_time`.
    pub fn process(
        &mut self,
        current_time: f64,
        instruments: &mut HashMap<TrackId, Box<dyn Instrument>>,
    ) {
        for (track_id, notes) in self.notes.iter_mut() {
            let Some(instrument) = instruments.get_mut(track_id) else {
                continue;
            };
            for note in notes.iter_mut() {
                if !note.armed && note.start_time <= current_time {
                    instrument.note_on(note.pitch, note.velocity, note.start_time);
                    note.armed = true;
                }
                if note.armed && !note.released && note.end_time <= current_time {
                    instrument.note_off(note.pitch, note.end_time);
                    note.released = true;
                }
            }
            notes.retain(|n| !(n.released && current_time - n.end_time > 1.0));
        }
    }

    /// A noteOn now and a noteOff 200ms later, for piano-roll interaction.
    pub fn preview_note(
        &mut self,
        track_id: TrackId,
        pitch: u8,
        velocity: u8,
        now: f64,
    ) {
        let entry = self.notes.entry(track_id).or_default();
        entry.push(ArmedNote {
            id: self.ids.next_midi_note_id(),
            clip_id: MidiClipId(u64::MAX),
            pitch,
            velocity: velocity.min(127),
            start_time: now,
            end_time: now + 0.2,
            armed: false,
            released: false,
        });
    }

    pub fn pending_count(&self, track_id: TrackId) -> usize {
        self.notes.get(&track_id).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        on: Vec<(u8, u8, f64)>,
        off: Vec<(u8, f64)>,
    }

    struct RecordingInstrument {
        log: Arc<Mutex<Log>>,
    }

    impl Instrument for RecordingInstrument {
        fn note_on(&mut self, pitch: u8, velocity: u8, at: f64) {
            self.log.lock().unwrap().on.push((pitch, velocity, at));
        }
        fn note_off(&mut self, pitch: u8, at: f64) {
            self.log.lock().unwrap().off.push((pitch, at));
        }
        fn dispose(&mut self) {}
    }

    #[test]
    fn staccato_halves_duration() {
        let ids = Arc::new(crate::ids::IdGenerator::new());
        let mut scheduler = MidiScheduler::new(ids);
        let mut clip = MidiClip::new(crate::ids::MidiClipId(0), 0.0);
        clip.add_note(MidiNote::new(60, 100, 0.0, 1.0).with_articulation(Articulation::Staccato));

        let track = TrackId(1);
        scheduler.schedule_clip(track, &clip, 0.0, 120.0);

        let log = Arc::new(Mutex::new(Log::default()));
        let mut instruments: HashMap<TrackId, Box<dyn Instrument>> = HashMap::new();
        instruments.insert(track, Box::new(RecordingInstrument { log: log.clone() }));

        scheduler.process(0.0, &mut instruments);
        scheduler.process(0.25, &mut instruments);

        assert_eq!(log.lock().unwrap().on, vec![(60, 100, 0.0)]);
        assert_eq!(log.lock().unwrap().off, vec![(60, 0.25)]);
    }

    #[test]
    fn accent_raises_velocity_clamped() {
        let note = MidiNote::new(60, 120, 0.0, 1.0).with_articulation(Articulation::Accent);
        let (_, velocity) = note.adjusted();
        assert_eq!(velocity, 127);
    }
}

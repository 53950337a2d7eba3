use crate::audio::tempo::{bar_beat_of, TimeSignature};
use crate::error::EngineResult;

/// The transport's play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportPhase {
    Stopped,
    Playing,
    Paused,
}

/// Snapshot emitted as `transport:state` on every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub is_playing: bool,
    pub position_seconds: f64,
    pub tempo: f64,
    pub is_looping: bool,
    pub loop_start_seconds: f64,
    pub loop_end_seconds: f64,
    pub bar: u32,
    pub beat: u32,
}

/// Transport state machine: play/pause/stop/seek/loop, and the
/// context-time <-> beat-position mapping.
///
/// Position is derived functionally from context time rather than kept as
/// an incrementing counter, since the host audio runtime (not this crate)
/// owns the sample clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    phase: TransportPhase,
    /// Position when stopped/paused; stale (not authoritative) while playing.
    position_seconds: f64,
    /// `now - position` at the moment playback last started; only
    /// meaningful while `phase == Playing`.
    start_context_time: f64,
    tempo: f64,
    time_signature: TimeSignature,
    is_looping: bool,
    loop_start_seconds: f64,
    loop_end_seconds: f64,
}

impl Transport {
    pub fn new(tempo: f64, time_signature: TimeSignature) -> Self {
        Self {
            phase: TransportPhase::Stopped,
            position_seconds: 0.0,
            start_context_time: 0.0,
            tempo,
            time_signature,
            is_looping: false,
            loop_start_seconds: 0.0,
            loop_end_seconds: 0.0,
        }
    }

    pub fn phase(&self) -> TransportPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == TransportPhase::Playing
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub fn loop_bounds(&self) -> (f64, f64) {
        (self.loop_start_seconds, self.loop_end_seconds)
    }

    /// `Stopped/Paused -> Playing`. `now` is the host's current context
    /// time. Resume failure is modeled by the caller passing
    /// `resume_ok = false`; on failure the transport remains `Stopped`/
    /// wherever it was and `start_context_time` is left untouched.
    pub fn play(&mut self, now: f64, resume_ok: bool) -> EngineResult<()> {
        if !resume_ok {
            log::warn!("transport play rejected: audio context resume failed");
            return Err(crate::error::EngineError::runtime_dsp(
                "audio context resume failed",
            ));
        }
        self.start_context_time = now - self.position_seconds;
        self.phase = TransportPhase::Playing;
        log::debug!("transport -> playing at position {:.3}s", self.position_seconds);
        Ok(())
    }

    /// `Playing -> Paused`.
    pub fn pause(&mut self, now: f64) {
        if self.phase != TransportPhase::Playing {
            return;
        }
        self.position_seconds = self.position(now);
        self.phase = TransportPhase::Paused;
        log::debug!("transport -> paused at position {:.3}s", self.position_seconds);
    }

    /// Any phase `-> Stopped`.
    pub fn stop(&mut self) {
        self.position_seconds = 0.0;
        self.phase = TransportPhase::Stopped;
        log::debug!("transport -> stopped");
    }

    /// `seek(p)`: `position = max(0, p)`; if playing, re-anchor
    /// `start_context_time`.
    pub fn seek(&mut self, now: f64, position: f64) {
        self.position_seconds = position.max(0.0);
        if self.phase == TransportPhase::Playing {
            self.start_context_time = now - self.position_seconds;
        }
        log::debug!("transport seek to {:.3}s", self.position_seconds);
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        debug_assert!(bpm > 0.0);
        log::debug!("transport tempo {} -> {}", self.tempo, bpm);
        self.tempo = bpm;
    }

    pub fn set_time_signature(&mut self, ts: TimeSignature) {
        self.time_signature = ts;
    }

    /// `setLoop(on, start?, end?)`: stores for future position reduction.
    pub fn set_loop(&mut self, on: bool, start: Option<f64>, end: Option<f64>) {
        self.is_looping = on;
        if let Some(s) = start {
            self.loop_start_seconds = s;
        }
        if let Some(e) = end {
            self.loop_end_seconds = e;
        }
        log::debug!(
            "transport loop {} [{:.3}, {:.3})",
            if on { "enabled" } else { "disabled" },
            self.loop_start_seconds,
            self.loop_end_seconds
        );
    }

    /// Loop-reduced position at context time `now`, without mutating
    /// `start_context_time`. Used for read-only position queries.
    pub fn position(&self, now: f64) -> f64 {
        if self.phase != TransportPhase::Playing {
            return self.position_seconds;
        }
        self.reduce(now - self.start_context_time).0
    }

    /// Like `position`, but also advances `start_context_time` when a loop
    /// wrap occurred, so subsequent computations remain coherent against the
    /// new anchor. Returns `(position, wrapped)`, where `wrapped` is true
    /// iff this call's reduction crossed at least one loop boundary (the
    /// signal `ClipScheduler` re-arms clips on).
    pub fn tick_position(&mut self, now: f64) -> (f64, bool) {
        if self.phase != TransportPhase::Playing {
            return (self.position_seconds, false);
        }
        let raw = now - self.start_context_time;
        let (reduced, advance) = self.reduce(raw);
        self.start_context_time += advance;
        (reduced, advance > 0.0)
    }

    /// Applies the loop-reduction formula to a raw elapsed duration.
    /// Returns `(reduced_position, start_context_time_advance)`.
    fn reduce(&self, raw: f64) -> (f64, f64) {
        if !self.is_looping {
            return (raw, 0.0);
        }
        let len = self.loop_end_seconds - self.loop_start_seconds;
        if len <= 0.0 || raw < self.loop_end_seconds {
            return (raw, 0.0);
        }
        let wraps = ((raw - self.loop_start_seconds) / len).floor();
        let reduced = self.loop_start_seconds + (raw - self.loop_start_seconds).rem_euclid(len);
        (reduced, len * wraps)
    }

    /// Context time at which beat 0 of the arrangement plays, used by
    /// `ClipScheduler`/`MidiScheduler` to anchor a beat position onto the
    /// host clock. While playing this is just `start_context_time`; while
    /// stopped/paused it is the context time at which beat 0 would play if
    /// `play()` were called right now, so clips can be armed ahead of
    /// playback starting.
    pub fn beat_zero_context_time(&self, now: f64) -> f64 {
        if self.phase == TransportPhase::Playing {
            self.start_context_time
        } else {
            now - self.position_seconds
        }
    }

    pub fn snapshot(&self, now: f64) -> TransportSnapshot {
        let position = self.position(now);
        let (bar, beat) = bar_beat_of(position, self.tempo, self.time_signature);
        TransportSnapshot {
            is_playing: self.is_playing(),
            position_seconds: position,
            tempo: self.tempo,
            is_looping: self.is_looping,
            loop_start_seconds: self.loop_start_seconds,
            loop_end_seconds: self.loop_end_seconds,
            bar,
            beat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_resets_position() {
        let mut t = Transport::new(120.0, TimeSignature::default());
        t.play(0.0, true).unwrap();
        let _ = t.tick_position(3.0);
        t.stop();
        assert_eq!(t.position(10.0), 0.0);
        assert!(!t.is_playing());
    }

    #[test]
    fn loop_keeps_position_in_bounds() {
        let mut t = Transport::new(120.0, TimeSignature::default());
        t.set_loop(true, Some(0.0), Some(4.0));
        t.play(0.0, true).unwrap();

        // Past the loop end: position must land back in [0, 4).
        let (pos, wrapped) = t.tick_position(5.0);
        assert!(pos >= 0.0 && pos < 4.0);
        assert!(wrapped);

        // Subsequent reads stay coherent against the advanced anchor: 5.5s
        // of real elapsed time mod a 4s loop is 1.5s.
        let (pos2, wrapped2) = t.tick_position(5.5);
        assert!((pos2 - 1.5).abs() < 1e-9);
        assert!(!wrapped2);
    }

    #[test]
    fn play_failure_leaves_state_untouched() {
        let mut t = Transport::new(120.0, TimeSignature::default());
        let before = t;
        let err = t.play(5.0, false);
        assert!(err.is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn seek_clamps_to_zero() {
        let mut t = Transport::new(120.0, TimeSignature::default());
        t.seek(0.0, -5.0);
        assert_eq!(t.position(0.0), 0.0);
    }
}

/// Time signature, `beatsPerBar / beatValue` (e.g. 4/4, 3/4, 6/8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSignature {
    pub beats_per_bar: u32,
    pub beat_value: u32,
}

impl TimeSignature {
    pub fn new(beats_per_bar: u32, beat_value: u32) -> Self {
        debug_assert!(beats_per_bar >= 1, "beats_per_bar must be >= 1");
        Self {
            beats_per_bar,
            beat_value,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// Sole authority for musical time: pure beats<->seconds conversion under a
/// scalar tempo, plus bar/beat addressing under a time signature.
///
/// Invariant: `tempo > 0`, `beats_per_bar >= 1`. Held by value everywhere a
/// conversion is needed rather than as shared mutable state; `Transport`
/// owns the live tempo and time signature and passes them in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoMap {
    pub tempo: f64,
    pub time_signature: TimeSignature,
}

impl TempoMap {
    pub fn new(tempo: f64, time_signature: TimeSignature) -> Self {
        debug_assert!(tempo > 0.0, "tempo must be > 0");
        Self {
            tempo,
            time_signature,
        }
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(120.0, TimeSignature::default())
    }
}

/// `seconds = beats * 60 / tempo`.
pub fn beats_to_seconds(beats: f64, tempo: f64) -> f64 {
    beats * 60.0 / tempo
}

/// `beats = seconds * tempo / 60`.
pub fn seconds_to_beats(seconds: f64, tempo: f64) -> f64 {
    seconds * tempo / 60.0
}

pub fn bars_to_beats(bars: f64, ts: TimeSignature) -> f64 {
    bars * ts.beats_per_bar as f64
}

pub fn beats_to_bars(beats: f64, ts: TimeSignature) -> f64 {
    beats / ts.beats_per_bar as f64
}

/// 1-indexed `(bar, beat)` for a transport position given in seconds.
pub fn bar_beat_of(position_seconds: f64, tempo: f64, ts: TimeSignature) -> (u32, u32) {
    let beats = seconds_to_beats(position_seconds.max(0.0), tempo);
    let beats_per_bar = ts.beats_per_bar.max(1) as f64;
    let bar = (beats / beats_per_bar).floor();
    let beat_in_bar = beats - bar * beats_per_bar;
    (bar as u32 + 1, beat_in_bar.floor() as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beats_seconds_round_trip() {
        for tempo in [60.0, 90.0, 120.0, 174.0] {
            for beats in [0.0, 1.0, 3.5, 16.0, 100.25] {
                let s = beats_to_seconds(beats, tempo);
                let back = seconds_to_beats(s, tempo);
                assert!((back - beats).abs() < 1e-9, "tempo={tempo} beats={beats}");
            }
        }
    }

    #[test]
    fn bars_beats_round_trip() {
        let ts = TimeSignature::new(4, 4);
        assert_eq!(bars_to_beats(2.0, ts), 8.0);
        assert_eq!(beats_to_bars(8.0, ts), 2.0);
    }

    #[test]
    fn bar_beat_at_120_bpm_4_4() {
        // 0.5s/beat at 120 BPM; bar 1 beat 1 at t=0.
        let ts = TimeSignature::new(4, 4);
        assert_eq!(bar_beat_of(0.0, 120.0, ts), (1, 1));
        // beat 3 of bar 1 is at 1.0s (2 beats in).
        assert_eq!(bar_beat_of(1.0, 120.0, ts), (1, 3));
        // bar 2 beat 1 is at 2.0s (4 beats in).
        assert_eq!(bar_beat_of(2.0, 120.0, ts), (2, 1));
    }
}

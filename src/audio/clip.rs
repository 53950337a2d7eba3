use crate::audio::tempo::beats_to_seconds;
use crate::ids::{ClipId, TrackId};

/// Absorbs timer jitter so a clip start is never scheduled in the past.
const SCHEDULE_EPSILON_SECONDS: f64 = 0.001;

/// A decoded audio buffer handle. Decoding itself is out of scope — the
/// core only needs a buffer's duration to clip playback against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferHandle {
    pub id: u64,
    pub duration_seconds: f64,
}

/// An audio clip as placed on the arrangement timeline: `{trackId, buffer,
/// startBeat, offsetSeconds, durationSeconds?, loop, playbackRate}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioClipPlacement {
    pub id: ClipId,
    pub track_id: TrackId,
    pub buffer: BufferHandle,
    pub start_beat: f64,
    pub duration_beats: f64,
    pub offset_seconds: f64,
    pub loop_enabled: bool,
    pub playback_rate: f64,
}

/// A resolved buffer-source start the engine must execute: the arguments
/// to `track.scheduleClip(buffer, contextTime, options)`, plus the owning
/// track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingClipStart {
    pub track_id: TrackId,
    pub buffer: BufferHandle,
    pub context_time: f64,
    pub offset_seconds: f64,
    pub duration_seconds: f64,
    pub loop_enabled: bool,
    pub playback_rate: f64,
}

/// Arms audio clips ahead of the playhead.
///
/// Keeps its own small ordered pending-start list rather than routing
/// through `LookaheadScheduler`'s boxed `FnOnce` callbacks: arming a clip
/// needs the track map and host, which only the façade holds, while those
/// callbacks close over nothing but scheduler state by design.
/// `AudioEngine::tick` drains `due()` and performs the start itself.
#[derive(Debug, Default)]
pub struct ClipScheduler {
    pending: Vec<PendingClipStart>,
    last_beat: f64,
}

impl ClipScheduler {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            last_beat: 0.0,
        }
    }

    /// Walks `clips`, arming those that overlap `[playback_start_beat, ∞)`.
    pub fn arm(
        &mut self,
        clips: &[AudioClipPlacement],
        playback_start_beat: f64,
        now: f64,
        tempo: f64,
    ) {
        self.pending.clear();
        self.last_beat = playback_start_beat;
        for clip in clips {
            let clip_end_beat = clip.start_beat + clip.duration_beats;
            if clip_end_beat <= playback_start_beat {
                continue;
            }

            // Step 1.
            let offset_beats = (playback_start_beat - clip.start_beat).max(0.0);
            // Step 2.
            let remaining_beats = clip.duration_beats - offset_beats;
            if remaining_beats <= 0.0 {
                continue;
            }
            // Step 3.
            let offset_seconds = clip.offset_seconds + beats_to_seconds(offset_beats, tempo);
            if offset_seconds >= clip.buffer.duration_seconds {
                continue;
            }
            // Step 4.
            let playback_duration = beats_to_seconds(remaining_beats, tempo)
                .min(clip.buffer.duration_seconds - offset_seconds);
            // Step 5.
            let beats_until_start = clip.start_beat - playback_start_beat;
            let context_time = now + beats_to_seconds(beats_until_start, tempo).max(SCHEDULE_EPSILON_SECONDS);

            self.pending.push(PendingClipStart {
                track_id: clip.track_id,
                buffer: clip.buffer,
                context_time,
                offset_seconds,
                duration_seconds: playback_duration,
                loop_enabled: clip.loop_enabled,
                playback_rate: clip.playback_rate,
            });
        }
        self.pending
            .sort_by(|a, b| a.context_time.partial_cmp(&b.context_time).unwrap());
        log::trace!("armed clips from beat {:.3}, {} pending", playback_start_beat, self.pending.len());
    }

    /// Detects a position that reads less than the previous one, signaling
    /// a loop wrap. Callers re-arm with `arm()` when this returns `true`.
    pub fn observe_position(&mut self, beat: f64) -> bool {
        let wrapped = beat < self.last_beat;
        self.last_beat = beat;
        wrapped
    }

    /// Removes every pending start that has entered `[now, now+lookahead]`
    /// and returns them in ascending `context_time` order, matching the
    /// `LookaheadScheduler` horizon-dispatch discipline.
    pub fn due(&mut self, horizon: f64) -> Vec<PendingClipStart> {
        let split = self
            .pending
            .iter()
            .position(|p| p.context_time > horizon)
            .unwrap_or(self.pending.len());
        self.pending.drain(..split).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(track: u64, start_beat: f64, duration_beats: f64, buffer_duration: f64) -> AudioClipPlacement {
        AudioClipPlacement {
            id: ClipId(0),
            track_id: TrackId(track),
            buffer: BufferHandle {
                id: 0,
                duration_seconds: buffer_duration,
            },
            start_beat,
            duration_beats,
            offset_seconds: 0.0,
            loop_enabled: false,
            playback_rate: 1.0,
        }
    }

    #[test]
    fn play_from_bar_two_offsets_into_buffer() {
        // 120 BPM: 0.5s/beat. Clip at beat 0, 4 beats long, 2s buffer.
        let clip = placement(1, 0.0, 4.0, 2.0);
        let mut sched = ClipScheduler::new();
        sched.arm(&[clip], 2.0, 0.0, 120.0);

        let due = sched.due(1.0);
        assert_eq!(due.len(), 1);
        assert!((due[0].offset_seconds - 1.0).abs() < 1e-9);
        assert!((due[0].duration_seconds - 1.0).abs() < 1e-9);
        assert!(due[0].context_time >= 0.0);
    }

    #[test]
    fn clip_entirely_before_playback_start_is_skipped() {
        let clip = placement(1, 0.0, 2.0, 5.0);
        let mut sched = ClipScheduler::new();
        sched.arm(&[clip], 10.0, 0.0, 120.0);
        assert_eq!(sched.due(1000.0).len(), 0);
    }

    #[test]
    fn rearming_twice_does_not_duplicate_pending_starts() {
        let clip = placement(1, 0.0, 4.0, 2.0);
        let mut sched = ClipScheduler::new();
        sched.arm(&[clip], 2.0, 0.0, 120.0);
        sched.arm(&[clip], 2.0, 0.0, 120.0);

        assert_eq!(sched.due(1.0).len(), 1);
    }

    #[test]
    fn loop_wrap_is_detected() {
        let mut sched = ClipScheduler::new();
        assert!(!sched.observe_position(0.0));
        assert!(!sched.observe_position(3.9));
        // Position dropped from 3.9 back to 0.1: a loop wrap.
        assert!(sched.observe_position(0.1));
        assert!(!sched.observe_position(1.0));
    }
}

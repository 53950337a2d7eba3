use crate::audio::tempo::{bar_beat_of, TimeSignature};
use crate::host::{AudioGraphHost, NodeId, NodeKind};

/// ~20ms, sample-rate-independent so clicks sound the same on any host.
const CLICK_DURATION_SECONDS: f64 = 0.02;
const CLICK_FREQUENCY_HZ: f32 = 1500.0;

/// `metronome:tick(bar, beat, time)`, handed back to the caller
/// (`AudioEngine`, which owns the event bus) rather than emitted by the
/// metronome itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetronomeTick {
    pub bar: u32,
    pub beat: u32,
    pub time: f64,
}

/// Schedules click buffer plays aligned to beats within a lookahead
/// window. Each click is a one-shot `BufferSource` node started through
/// `AudioGraphHost`; beat bookkeeping is `nextBeatNumber`/`nextBeatTime`
/// rather than a running sample counter.
pub struct Metronome {
    enabled: bool,
    click_buffer: Vec<f32>,
    next_beat_number: u64,
    next_beat_time: f64,
    master_gain: NodeId,
}

impl Metronome {
    /// `master_gain` is the bus this metronome's clicks are routed into;
    /// owned by `AudioEngine`, not by this struct (spec §3's ownership
    /// table).
    pub fn new(host: &mut dyn AudioGraphHost, master_gain: NodeId) -> Self {
        Self {
            enabled: false,
            click_buffer: Self::generate_click(host.sample_rate()),
            next_beat_number: 0,
            next_beat_time: 0.0,
            master_gain,
        }
    }

    /// One-channel exponential-decay click, per spec §4.5.
    fn generate_click(sample_rate: f64) -> Vec<f32> {
        let samples = (sample_rate * CLICK_DURATION_SECONDS) as usize;
        (0..samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let envelope = (-t * 80.0).exp();
                (2.0 * std::f32::consts::PI * CLICK_FREQUENCY_HZ * t).sin() * envelope
            })
            .collect()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Aligns `nextBeatNumber`/`nextBeatTime` with the current play
    /// position, per spec §4.5. Called whenever the transport starts,
    /// seeks, or the tempo changes underneath it.
    pub fn reset(&mut self, start_context_time: f64, start_position_seconds: f64, seconds_per_beat: f64) {
        let beat_number = (start_position_seconds / seconds_per_beat).ceil().max(0.0);
        self.next_beat_number = beat_number as u64;
        let beat_time_position = beat_number * seconds_per_beat;
        self.next_beat_time = start_context_time + (beat_time_position - start_position_seconds);
    }

    /// Emits click buffer plays for every beat time within
    /// `[window_start, window_end)` and returns the `metronome:tick`s to
    /// emit for them, per spec §4.5.
    pub fn schedule_beats(
        &mut self,
        host: &mut dyn AudioGraphHost,
        window_start: f64,
        window_end: f64,
        seconds_per_beat: f64,
        time_signature: TimeSignature,
    ) -> Vec<MetronomeTick> {
        if !self.enabled || seconds_per_beat <= 0.0 {
            return Vec::new();
        }

        let mut ticks = Vec::new();
        while self.next_beat_time >= window_start && self.next_beat_time < window_end {
            let source = host.create_node(NodeKind::BufferSource);
            host.load_buffer(source, &self.click_buffer);
            host.connect(source, self.master_gain);
            host.start_buffer(source, self.next_beat_time, 0.0, None);

            let position_seconds = self.next_beat_number as f64 * seconds_per_beat;
            let (bar, beat) = bar_beat_of(position_seconds, 60.0 / seconds_per_beat, time_signature);
            ticks.push(MetronomeTick {
                bar,
                beat,
                time: self.next_beat_time,
            });

            self.next_beat_number += 1;
            self.next_beat_time += seconds_per_beat;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    #[test]
    fn reset_aligns_next_beat_to_current_position() {
        let mut host = SimulatedHost::new(48_000.0);
        let bus = host.create_node(NodeKind::Gain);
        let mut metronome = Metronome::new(&mut host, bus);
        metronome.set_enabled(true);

        // 0.5s/beat; starting mid-beat at 1.2s should land next beat at 1.5s.
        metronome.reset(10.0, 1.2, 0.5);
        assert_eq!(metronome.next_beat_number, 3);
        assert!((metronome.next_beat_time - 10.3).abs() < 1e-9);
    }

    #[test]
    fn schedule_beats_emits_one_tick_per_beat_in_window() {
        let mut host = SimulatedHost::new(48_000.0);
        let bus = host.create_node(NodeKind::Gain);
        let mut metronome = Metronome::new(&mut host, bus);
        metronome.set_enabled(true);
        metronome.reset(0.0, 0.0, 0.5);

        let ticks = metronome.schedule_beats(&mut host, 0.0, 1.0, 0.5, TimeSignature::new(4, 4));
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].time, 0.0);
        assert_eq!(ticks[1].time, 0.5);
        assert_eq!(host.start_calls.len(), 2);
    }

    #[test]
    fn disabled_metronome_schedules_nothing() {
        let mut host = SimulatedHost::new(48_000.0);
        let bus = host.create_node(NodeKind::Gain);
        let mut metronome = Metronome::new(&mut host, bus);
        metronome.reset(0.0, 0.0, 0.5);

        let ticks = metronome.schedule_beats(&mut host, 0.0, 2.0, 0.5, TimeSignature::new(4, 4));
        assert!(ticks.is_empty());
    }
}

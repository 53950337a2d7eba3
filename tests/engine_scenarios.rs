//! End-to-end scenarios driven entirely through `AudioEngine`'s public
//! contract: play-from-mid-timeline offset, loop-wrap re-scheduling,
//! solo isolation, effect-chain state round-tripping, MIDI articulation,
//! and scheduler cancellation.
//!
//! `AudioEngine` owns its `Box<dyn AudioGraphHost>` outright, so once it is
//! constructed nothing outside the crate can advance `SimulatedHost`'s
//! clock directly. `ClockHost` below wraps a `SimulatedHost` purely for its
//! node-graph bookkeeping and substitutes a `HostClock` the test keeps a
//! handle to, so elapsed time can still be driven from outside.

use daw_core::audio::clip::{AudioClipPlacement, BufferHandle};
use daw_core::audio::midi::{Articulation, Instrument, MidiClip, MidiNote};
use daw_core::audio::tempo::TimeSignature;
use daw_core::host::{HostClock, ParamName, SimulatedHost};
use daw_core::{AudioEngine, AudioGraphHost, ClipId, EffectKind, EffectTarget, MidiClipId, NodeId, NodeKind, TrackConfig, TrackKind, TrackUpdate};
use std::sync::{Arc, Mutex};

/// `env_logger::init()` panics if called more than once per process, and
/// every `#[test]` in this file runs in the same process — `try_init`
/// ignores the "already initialized" error from the second test onward.
fn init_logging() {
    let _ = env_logger::try_init();
}

struct ClockHost {
    inner: SimulatedHost,
    clock: HostClock,
    starts: Arc<Mutex<Vec<(f64, f64, Option<f64>)>>>,
    gain_sets: Arc<Mutex<Vec<f64>>>,
}

impl ClockHost {
    fn new(sample_rate: f64) -> (Self, HostClock, Arc<Mutex<Vec<(f64, f64, Option<f64>)>>>, Arc<Mutex<Vec<f64>>>) {
        let clock = HostClock::new(0.0);
        let starts = Arc::new(Mutex::new(Vec::new()));
        let gain_sets = Arc::new(Mutex::new(Vec::new()));
        let host = Self {
            inner: SimulatedHost::new(sample_rate),
            clock: clock.clone(),
            starts: starts.clone(),
            gain_sets: gain_sets.clone(),
        };
        (host, clock, starts, gain_sets)
    }
}

impl AudioGraphHost for ClockHost {
    fn current_time(&self) -> f64 {
        self.clock.get()
    }
    fn sample_rate(&self) -> f64 {
        self.inner.sample_rate()
    }
    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.inner.create_node(kind)
    }
    fn connect(&mut self, from: NodeId, to: NodeId) {
        self.inner.connect(from, to)
    }
    fn disconnect(&mut self, from: NodeId, to: NodeId) {
        self.inner.disconnect(from, to)
    }
    fn disconnect_all(&mut self, node: NodeId) {
        self.inner.disconnect_all(node)
    }
    fn dispose(&mut self, node: NodeId) {
        self.inner.dispose(node)
    }
    fn set_param(&mut self, node: NodeId, param: ParamName, value: f64) {
        if param == "gain" {
            self.gain_sets.lock().unwrap().push(value);
        }
        self.inner.set_param(node, param, value)
    }
    fn get_param(&self, node: NodeId, param: ParamName) -> f64 {
        self.inner.get_param(node, param)
    }
    fn load_buffer(&mut self, node: NodeId, samples: &[f32]) {
        self.inner.load_buffer(node, samples)
    }
    fn start_buffer(&mut self, node: NodeId, context_time: f64, offset: f64, duration: Option<f64>) {
        self.starts.lock().unwrap().push((context_time, offset, duration));
        self.inner.start_buffer(node, context_time, offset, duration)
    }
    fn stop(&mut self, node: NodeId, at: f64) {
        self.inner.stop(node, at)
    }
    fn resume(&mut self) -> bool {
        self.inner.resume()
    }
    fn suspend(&mut self) -> bool {
        self.inner.suspend()
    }
    fn close(&mut self) {
        self.inner.close()
    }
}

fn placement(id: u64, track_id: daw_core::TrackId, start_beat: f64, duration_beats: f64, buffer_seconds: f64) -> AudioClipPlacement {
    AudioClipPlacement {
        id: ClipId(id),
        track_id,
        buffer: BufferHandle {
            id,
            duration_seconds: buffer_seconds,
        },
        start_beat,
        duration_beats,
        offset_seconds: 0.0,
        loop_enabled: false,
        playback_rate: 1.0,
    }
}

#[test]
fn play_from_bar_two_starts_clip_with_correct_offset() {
    init_logging();
    let (host, clock, starts, _gains) = ClockHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());

    let track_id = engine.create_track(TrackConfig::default()).unwrap();
    // 4-beat clip at beat 0 backed by a 2s buffer; 120 BPM means 1 beat = 0.5s.
    engine.schedule_clip(placement(0, track_id, 0.0, 4.0, 2.0)).unwrap();

    // Seek to beat 2 (1.0s in) before starting playback.
    engine.seek(1.0).unwrap();
    engine.play().unwrap();
    engine.tick();

    let snapshot = engine.transport_snapshot();
    assert_eq!((snapshot.bar, snapshot.beat), (1, 3));

    // The clip should have armed 1 second into its buffer, for the
    // remaining 1 second.
    {
        let recorded = starts.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!((recorded[0].1 - 1.0).abs() < 1e-9, "offset: {:?}", recorded[0]);
        assert_eq!(recorded[0].2, Some(1.0));
    }

    // Half a second later the transport should read bar 2, beat 1.
    clock.advance(0.5);
    engine.tick();
    let snapshot = engine.transport_snapshot();
    assert_eq!((snapshot.bar, snapshot.beat), (2, 1));
}

#[test]
fn loop_wrap_rearms_the_clip_for_its_second_iteration() {
    init_logging();
    let (host, clock, starts, _gains) = ClockHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());

    let track_id = engine.create_track(TrackConfig::default()).unwrap();
    // Clip at beat 3, 2 beats long, well within a 5s buffer.
    engine.schedule_clip(placement(0, track_id, 3.0, 2.0, 5.0)).unwrap();

    // A 4-beat loop at 120 BPM is 2 seconds.
    engine.set_loop(true, Some(0.0), Some(2.0)).unwrap();
    engine.play().unwrap();
    engine.tick();

    // Advance to just past the clip's first scheduled start (beat 3 = 1.5s).
    clock.advance(1.4);
    engine.tick();
    assert_eq!(starts.lock().unwrap().len(), 1);

    // Cross the loop boundary at 2.0s; position wraps back toward 0.
    clock.advance(0.65); // now at 2.05s
    engine.tick();
    let snapshot = engine.transport_snapshot();
    assert!(snapshot.position_seconds < 1.4);

    // Advance to the clip's second-iteration start (beat 3 again, now
    // anchored past the wrap).
    clock.advance(1.4);
    engine.tick();

    let recorded = starts.lock().unwrap();
    assert_eq!(recorded.len(), 2, "clip should have restarted after the loop wrap");
    assert!((recorded[1].1 - recorded[0].1).abs() < 1e-9);
    assert_eq!(recorded[1].2, recorded[0].2);
}

#[test]
fn solo_isolates_track_and_clearing_solo_restores_volumes() {
    init_logging();
    let (host, _clock, _starts, gains) = ClockHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());

    let _a = engine.create_track(TrackConfig::default()).unwrap();
    let b = engine.create_track(TrackConfig::default()).unwrap();
    let _c = engine.create_track(TrackConfig::default()).unwrap();

    engine.update_track(
        b,
        TrackUpdate {
            solo: Some(true),
            ..Default::default()
        },
    );

    // recompute_gains() applies exactly one gain write per track; the last
    // three writes are this call's, in some track order.
    let mut last_three: Vec<f64> = {
        let g = gains.lock().unwrap();
        g[g.len() - 3..].to_vec()
    };
    last_three.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(last_three, vec![0.0, 0.0, 1.0]);

    engine.update_track(
        b,
        TrackUpdate {
            solo: Some(false),
            ..Default::default()
        },
    );
    let mut last_three: Vec<f64> = {
        let g = gains.lock().unwrap();
        g[g.len() - 3..].to_vec()
    };
    last_three.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(last_three, vec![1.0, 1.0, 1.0]);
}

#[test]
fn effect_chain_state_round_trips_through_the_master_bus() {
    init_logging();
    let host = SimulatedHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());

    let reverb = engine.add_effect(EffectTarget::Master, EffectKind::Reverb, None).unwrap();
    engine.set_effect_parameter(EffectTarget::Master, reverb, "wet_level", 0.4).unwrap();
    let delay = engine.add_effect(EffectTarget::Master, EffectKind::Delay, None).unwrap();
    engine.set_effect_parameter(EffectTarget::Master, delay, "feedback", 0.3).unwrap();

    let state = engine.serialize_state();
    engine.set_state(&state).unwrap();
    let round_tripped = engine.serialize_state();

    assert_eq!(state["master"]["effects"], round_tripped["master"]["effects"]);
}

#[test]
fn staccato_note_fires_note_off_at_half_its_written_duration() {
    init_logging();
    let (host, clock, _starts, _gains) = ClockHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());

    let track_id = engine.create_track(TrackConfig {
        kind: TrackKind::Instrument,
        ..Default::default()
    }).unwrap();

    #[derive(Default)]
    struct Log {
        on: Vec<(u8, u8, f64)>,
        off: Vec<(u8, f64)>,
    }
    struct Spy {
        log: Arc<Mutex<Log>>,
    }
    impl Instrument for Spy {
        fn note_on(&mut self, pitch: u8, velocity: u8, at_context_time: f64) {
            self.log.lock().unwrap().on.push((pitch, velocity, at_context_time));
        }
        fn note_off(&mut self, pitch: u8, at_context_time: f64) {
            self.log.lock().unwrap().off.push((pitch, at_context_time));
        }
        fn dispose(&mut self) {}
    }

    let log = Arc::new(Mutex::new(Log::default()));
    engine.attach_instrument(track_id, Box::new(Spy { log: log.clone() })).unwrap();

    let mut clip = MidiClip::new(MidiClipId(0), 0.0);
    clip.add_note(MidiNote::new(60, 100, 0.0, 1.0).with_articulation(Articulation::Staccato));
    engine.schedule_midi_clip(track_id, clip).unwrap();

    engine.play().unwrap();
    engine.tick(); // now = 0.0: the note's start time

    clock.advance(0.25); // 120 BPM, staccato halves 1 beat to 0.5 beats = 0.25s
    engine.tick();

    let log = log.lock().unwrap();
    assert_eq!(log.on, vec![(60, 100, 0.0)]);
    assert_eq!(log.off, vec![(60, 0.25)]);
}

#[test]
fn cancelled_scheduled_event_never_fires() {
    init_logging();
    let (host, clock, _starts, _gains) = ClockHost::new(48_000.0);
    let mut engine = AudioEngine::new(Box::new(host), 120.0, TimeSignature::default());
    engine.play().unwrap();

    let fired = Arc::new(Mutex::new(false));
    let f = fired.clone();
    let id = engine.schedule(1.0, Box::new(move |_t, _s| *f.lock().unwrap() = true));
    engine.cancel_scheduled(id);

    for _ in 0..3 {
        clock.advance(0.5);
        engine.tick();
    }

    assert!(!*fired.lock().unwrap());
}

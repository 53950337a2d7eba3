use super::effect_trait::{Effect, ParamCurve, ParamSpec};
use crate::host::{AudioGraphHost, NodeId, NodeKind};

/// Which concrete effect to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Reverb,
    Delay,
    Eq,
    Compressor,
    Distortion,
    Filter,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::Eq => "eq",
            EffectKind::Compressor => "compressor",
            EffectKind::Distortion => "distortion",
            EffectKind::Filter => "filter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "reverb" => Some(EffectKind::Reverb),
            "delay" => Some(EffectKind::Delay),
            "eq" => Some(EffectKind::Eq),
            "compressor" => Some(EffectKind::Compressor),
            "distortion" => Some(EffectKind::Distortion),
            "filter" => Some(EffectKind::Filter),
            _ => None,
        }
    }

    /// Constructs the concrete effect, wiring its host nodes. Nodes are
    /// built once here and reconfigured in place by `set_parameter`
    /// thereafter, never recreated.
    pub fn instantiate(&self, host: &mut dyn AudioGraphHost) -> Box<dyn Effect> {
        match self {
            EffectKind::Reverb => Box::new(ReverbEffect::new(host)),
            EffectKind::Delay => Box::new(DelayEffect::new(host)),
            EffectKind::Eq => Box::new(EqEffect::new(host)),
            EffectKind::Compressor => Box::new(CompressorEffect::new(host)),
            EffectKind::Distortion => Box::new(DistortionEffect::new(host)),
            EffectKind::Filter => Box::new(FilterEffect::new(host)),
        }
    }
}

/// Common wet/dry plumbing shared by every effect kind: `input -> dry_gain
/// -> output` and, in parallel, `input -> wet_entry ... wet_exit -> wet_gain
/// -> output`. Bypass disconnects the wet leg entirely rather than zeroing
/// its gain, so a bypassed effect costs nothing in the host graph.
struct WetDry {
    input: NodeId,
    output: NodeId,
    dry_gain: NodeId,
    wet_gain: NodeId,
    enabled: bool,
    wet: f64,
    dry: f64,
}

impl WetDry {
    fn new(host: &mut dyn AudioGraphHost, wet_entry: NodeId, wet_exit: NodeId) -> Self {
        let input = host.create_node(NodeKind::Gain);
        let output = host.create_node(NodeKind::Gain);
        let dry_gain = host.create_node(NodeKind::Gain);
        let wet_gain = host.create_node(NodeKind::Gain);

        host.set_param(input, "gain", 1.0);
        host.set_param(output, "gain", 1.0);

        let mut wd = Self {
            input,
            output,
            dry_gain,
            wet_gain,
            enabled: true,
            wet: 1.0,
            dry: 0.0,
        };
        wd.connect_wet(host, wet_entry, wet_exit);
        wd.apply_mix(host);
        wd
    }

    fn connect_wet(&self, host: &mut dyn AudioGraphHost, wet_entry: NodeId, wet_exit: NodeId) {
        host.connect(self.input, self.dry_gain);
        host.connect(self.dry_gain, self.output);
        if self.enabled {
            host.connect(self.input, wet_entry);
            host.connect(wet_exit, self.wet_gain);
            host.connect(self.wet_gain, self.output);
        }
    }

    fn set_enabled(
        &mut self,
        host: &mut dyn AudioGraphHost,
        enabled: bool,
        wet_entry: NodeId,
        wet_exit: NodeId,
    ) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            host.connect(self.input, wet_entry);
            host.connect(wet_exit, self.wet_gain);
            host.connect(self.wet_gain, self.output);
        } else {
            host.disconnect(self.input, wet_entry);
            host.disconnect(wet_exit, self.wet_gain);
            host.disconnect(self.wet_gain, self.output);
        }
        self.apply_mix(host);
    }

    fn set_mix(&mut self, host: &mut dyn AudioGraphHost, wet: f64, dry: f64) {
        self.wet = wet.clamp(0.0, 1.0);
        self.dry = dry.clamp(0.0, 1.0);
        self.apply_mix(host);
    }

    fn apply_mix(&self, host: &mut dyn AudioGraphHost) {
        let wet = if self.enabled { self.wet } else { 0.0 };
        let dry = if self.enabled { self.dry } else { 1.0 };
        host.set_param(self.wet_gain, "gain", wet);
        host.set_param(self.dry_gain, "gain", dry);
    }

    fn dispose(&self, host: &mut dyn AudioGraphHost) {
        host.dispose(self.input);
        host.dispose(self.output);
        host.dispose(self.dry_gain);
        host.dispose(self.wet_gain);
    }
}

macro_rules! impl_common_effect_methods {
    () => {
        fn set_enabled(&mut self, host: &mut dyn AudioGraphHost, enabled: bool) {
            let entry = self.wet_entry();
            let exit = self.wet_exit();
            self.wd.set_enabled(host, enabled, entry, exit);
        }

        fn is_enabled(&self) -> bool {
            self.wd.enabled
        }

        fn set_mix(&mut self, host: &mut dyn AudioGraphHost, wet: f64, dry: f64) {
            self.wd.set_mix(host, wet, dry);
        }

        fn input_node(&self) -> NodeId {
            self.wd.input
        }

        fn output_node(&self) -> NodeId {
            self.wd.output
        }
    };
}

const REVERB_PARAMS: [ParamSpec; 3] = [
    ParamSpec {
        id: "room_size",
        name: "Room Size",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "damping",
        name: "Damping",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "wet_level",
        name: "Wet Level",
        min: 0.0,
        max: 1.0,
        default: 0.3,
        curve: ParamCurve::Linear,
    },
];

pub struct ReverbEffect {
    wd: WetDry,
    convolver: NodeId,
    room_size: f64,
    damping: f64,
    wet_level: f64,
}

impl ReverbEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let convolver = host.create_node(NodeKind::Convolver);
        host.set_param(convolver, "room_size", REVERB_PARAMS[0].default);
        host.set_param(convolver, "damping", REVERB_PARAMS[1].default);
        let mut effect = Self {
            wd: WetDry::new(host, convolver, convolver),
            convolver,
            room_size: REVERB_PARAMS[0].default,
            damping: REVERB_PARAMS[1].default,
            wet_level: REVERB_PARAMS[2].default,
        };
        effect.wd.set_mix(host, effect.wet_level, 1.0 - effect.wet_level);
        effect
    }

    fn wet_entry(&self) -> NodeId {
        self.convolver
    }
    fn wet_exit(&self) -> NodeId {
        self.convolver
    }
}

impl Effect for ReverbEffect {
    fn params(&self) -> &[ParamSpec] {
        &REVERB_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        match id {
            "room_size" => {
                self.room_size = REVERB_PARAMS[0].clamp(value);
                host.set_param(self.convolver, "room_size", self.room_size);
            }
            "damping" => {
                self.damping = REVERB_PARAMS[1].clamp(value);
                host.set_param(self.convolver, "damping", self.damping);
            }
            "wet_level" => {
                self.wet_level = REVERB_PARAMS[2].clamp(value);
                self.wd.set_mix(host, self.wet_level, 1.0 - self.wet_level);
            }
            _ => {}
        }
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "room_size" => self.room_size,
            "damping" => self.damping,
            "wet_level" => self.wet_level,
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.convolver);
    }

    fn kind_name(&self) -> &'static str {
        "reverb"
    }
}

const DELAY_PARAMS: [ParamSpec; 3] = [
    ParamSpec {
        id: "time_seconds",
        name: "Delay Time",
        min: 0.0,
        max: 2.0,
        default: 0.3,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "feedback",
        name: "Feedback",
        min: 0.0,
        max: 0.95,
        default: 0.3,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "mix",
        name: "Mix",
        min: 0.0,
        max: 1.0,
        default: 0.3,
        curve: ParamCurve::Linear,
    },
];

pub struct DelayEffect {
    wd: WetDry,
    delay_node: NodeId,
    feedback_gain: NodeId,
    time_seconds: f64,
    feedback: f64,
    mix: f64,
}

impl DelayEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let delay_node = host.create_node(NodeKind::Delay);
        let feedback_gain = host.create_node(NodeKind::Gain);
        host.set_param(delay_node, "time_seconds", DELAY_PARAMS[0].default);
        host.set_param(feedback_gain, "gain", DELAY_PARAMS[1].default);
        // delay -> feedback_gain -> delay forms the repeat loop.
        host.connect(delay_node, feedback_gain);
        host.connect(feedback_gain, delay_node);

        let mut effect = Self {
            wd: WetDry::new(host, delay_node, delay_node),
            delay_node,
            feedback_gain,
            time_seconds: DELAY_PARAMS[0].default,
            feedback: DELAY_PARAMS[1].default,
            mix: DELAY_PARAMS[2].default,
        };
        effect.wd.set_mix(host, effect.mix, 1.0 - effect.mix);
        effect
    }

    fn wet_entry(&self) -> NodeId {
        self.delay_node
    }
    fn wet_exit(&self) -> NodeId {
        self.delay_node
    }
}

impl Effect for DelayEffect {
    fn params(&self) -> &[ParamSpec] {
        &DELAY_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        match id {
            "time_seconds" => {
                self.time_seconds = DELAY_PARAMS[0].clamp(value);
                host.set_param(self.delay_node, "time_seconds", self.time_seconds);
            }
            "feedback" => {
                self.feedback = DELAY_PARAMS[1].clamp(value);
                host.set_param(self.feedback_gain, "gain", self.feedback);
            }
            "mix" => {
                self.mix = DELAY_PARAMS[2].clamp(value);
                self.wd.set_mix(host, self.mix, 1.0 - self.mix);
            }
            _ => {}
        }
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "time_seconds" => self.time_seconds,
            "feedback" => self.feedback,
            "mix" => self.mix,
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.feedback_gain);
        host.dispose(self.delay_node);
    }

    fn kind_name(&self) -> &'static str {
        "delay"
    }
}

const EQ_PARAMS: [ParamSpec; 6] = [
    ParamSpec {
        id: "low_gain_db",
        name: "Low Gain",
        min: -12.0,
        max: 12.0,
        default: 0.0,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "mid_gain_db",
        name: "Mid Gain",
        min: -12.0,
        max: 12.0,
        default: 0.0,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "high_gain_db",
        name: "High Gain",
        min: -12.0,
        max: 12.0,
        default: 0.0,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "low_freq",
        name: "Low Frequency",
        min: 20.0,
        max: 500.0,
        default: 250.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "mid_freq",
        name: "Mid Frequency",
        min: 200.0,
        max: 5000.0,
        default: 1000.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "high_freq",
        name: "High Frequency",
        min: 2000.0,
        max: 20000.0,
        default: 8000.0,
        curve: ParamCurve::Logarithmic,
    },
];

/// Multi-band EQ: three `Biquad` peaking bands (low/mid/high shelf-ish)
/// wired in series.
pub struct EqEffect {
    wd: WetDry,
    low: NodeId,
    mid: NodeId,
    high: NodeId,
    values: [f64; 6],
}

impl EqEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let low = host.create_node(NodeKind::Biquad);
        let mid = host.create_node(NodeKind::Biquad);
        let high = host.create_node(NodeKind::Biquad);
        host.connect(low, mid);
        host.connect(mid, high);

        let values = [
            EQ_PARAMS[0].default,
            EQ_PARAMS[1].default,
            EQ_PARAMS[2].default,
            EQ_PARAMS[3].default,
            EQ_PARAMS[4].default,
            EQ_PARAMS[5].default,
        ];
        let mut effect = Self {
            wd: WetDry::new(host, low, high),
            low,
            mid,
            high,
            values,
        };
        effect.push_band_params(host);
        effect.wd.set_mix(host, 1.0, 0.0);
        effect
    }

    fn push_band_params(&self, host: &mut dyn AudioGraphHost) {
        host.set_param(self.low, "gain_db", self.values[0]);
        host.set_param(self.low, "freq", self.values[3]);
        host.set_param(self.mid, "gain_db", self.values[1]);
        host.set_param(self.mid, "freq", self.values[4]);
        host.set_param(self.high, "gain_db", self.values[2]);
        host.set_param(self.high, "freq", self.values[5]);
    }

    fn wet_entry(&self) -> NodeId {
        self.low
    }
    fn wet_exit(&self) -> NodeId {
        self.high
    }
}

impl Effect for EqEffect {
    fn params(&self) -> &[ParamSpec] {
        &EQ_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        let idx = match id {
            "low_gain_db" => 0,
            "mid_gain_db" => 1,
            "high_gain_db" => 2,
            "low_freq" => 3,
            "mid_freq" => 4,
            "high_freq" => 5,
            _ => return,
        };
        self.values[idx] = EQ_PARAMS[idx].clamp(value);
        self.push_band_params(host);
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "low_gain_db" => self.values[0],
            "mid_gain_db" => self.values[1],
            "high_gain_db" => self.values[2],
            "low_freq" => self.values[3],
            "mid_freq" => self.values[4],
            "high_freq" => self.values[5],
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.low);
        host.dispose(self.mid);
        host.dispose(self.high);
    }

    fn kind_name(&self) -> &'static str {
        "eq"
    }
}

const COMPRESSOR_PARAMS: [ParamSpec; 5] = [
    ParamSpec {
        id: "threshold_db",
        name: "Threshold",
        min: -60.0,
        max: 0.0,
        default: -24.0,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "ratio",
        name: "Ratio",
        min: 1.0,
        max: 20.0,
        default: 4.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "attack_ms",
        name: "Attack",
        min: 0.0,
        max: 200.0,
        default: 10.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "release_ms",
        name: "Release",
        min: 10.0,
        max: 1000.0,
        default: 150.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "makeup_db",
        name: "Makeup Gain",
        min: 0.0,
        max: 24.0,
        default: 0.0,
        curve: ParamCurve::Linear,
    },
];

pub struct CompressorEffect {
    wd: WetDry,
    compressor: NodeId,
    makeup_gain: NodeId,
    values: [f64; 5],
}

impl CompressorEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let compressor = host.create_node(NodeKind::Compressor);
        let makeup_gain = host.create_node(NodeKind::Gain);
        host.connect(compressor, makeup_gain);

        let values = [
            COMPRESSOR_PARAMS[0].default,
            COMPRESSOR_PARAMS[1].default,
            COMPRESSOR_PARAMS[2].default,
            COMPRESSOR_PARAMS[3].default,
            COMPRESSOR_PARAMS[4].default,
        ];
        let mut effect = Self {
            wd: WetDry::new(host, compressor, makeup_gain),
            compressor,
            makeup_gain,
            values,
        };
        effect.push_params(host);
        effect.wd.set_mix(host, 1.0, 0.0);
        effect
    }

    fn push_params(&self, host: &mut dyn AudioGraphHost) {
        host.set_param(self.compressor, "threshold_db", self.values[0]);
        host.set_param(self.compressor, "ratio", self.values[1]);
        host.set_param(self.compressor, "attack_ms", self.values[2]);
        host.set_param(self.compressor, "release_ms", self.values[3]);
        let makeup_linear = 10f64.powf(self.values[4] / 20.0);
        host.set_param(self.makeup_gain, "gain", makeup_linear);
    }

    fn wet_entry(&self) -> NodeId {
        self.compressor
    }
    fn wet_exit(&self) -> NodeId {
        self.makeup_gain
    }
}

impl Effect for CompressorEffect {
    fn params(&self) -> &[ParamSpec] {
        &COMPRESSOR_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        let idx = match id {
            "threshold_db" => 0,
            "ratio" => 1,
            "attack_ms" => 2,
            "release_ms" => 3,
            "makeup_db" => 4,
            _ => return,
        };
        self.values[idx] = COMPRESSOR_PARAMS[idx].clamp(value);
        self.push_params(host);
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "threshold_db" => self.values[0],
            "ratio" => self.values[1],
            "attack_ms" => self.values[2],
            "release_ms" => self.values[3],
            "makeup_db" => self.values[4],
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.makeup_gain);
        host.dispose(self.compressor);
    }

    fn kind_name(&self) -> &'static str {
        "compressor"
    }
}

const DISTORTION_PARAMS: [ParamSpec; 2] = [
    ParamSpec {
        id: "drive",
        name: "Drive",
        min: 0.0,
        max: 1.0,
        default: 0.4,
        curve: ParamCurve::Linear,
    },
    ParamSpec {
        id: "tone",
        name: "Tone",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        curve: ParamCurve::Linear,
    },
];

pub struct DistortionEffect {
    wd: WetDry,
    waveshaper: NodeId,
    tone_filter: NodeId,
    drive: f64,
    tone: f64,
}

impl DistortionEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let waveshaper = host.create_node(NodeKind::Waveshaper);
        let tone_filter = host.create_node(NodeKind::Biquad);
        host.connect(waveshaper, tone_filter);

        let mut effect = Self {
            wd: WetDry::new(host, waveshaper, tone_filter),
            waveshaper,
            tone_filter,
            drive: DISTORTION_PARAMS[0].default,
            tone: DISTORTION_PARAMS[1].default,
        };
        effect.push_params(host);
        effect.wd.set_mix(host, 1.0, 0.0);
        effect
    }

    fn push_params(&self, host: &mut dyn AudioGraphHost) {
        host.set_param(self.waveshaper, "drive", self.drive);
        host.set_param(self.tone_filter, "freq", 500.0 + self.tone * 9500.0);
    }

    fn wet_entry(&self) -> NodeId {
        self.waveshaper
    }
    fn wet_exit(&self) -> NodeId {
        self.tone_filter
    }
}

impl Effect for DistortionEffect {
    fn params(&self) -> &[ParamSpec] {
        &DISTORTION_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        match id {
            "drive" => self.drive = DISTORTION_PARAMS[0].clamp(value),
            "tone" => self.tone = DISTORTION_PARAMS[1].clamp(value),
            _ => return,
        }
        self.push_params(host);
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "drive" => self.drive,
            "tone" => self.tone,
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.tone_filter);
        host.dispose(self.waveshaper);
    }

    fn kind_name(&self) -> &'static str {
        "distortion"
    }
}

const FILTER_PARAMS: [ParamSpec; 3] = [
    ParamSpec {
        id: "cutoff_hz",
        name: "Cutoff",
        min: 20.0,
        max: 20000.0,
        default: 1000.0,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "resonance",
        name: "Resonance",
        min: 0.1,
        max: 20.0,
        default: 0.707,
        curve: ParamCurve::Logarithmic,
    },
    ParamSpec {
        id: "mode",
        name: "Mode",
        min: 0.0,
        max: 2.0,
        default: 0.0,
        curve: ParamCurve::Linear,
    },
];

pub struct FilterEffect {
    wd: WetDry,
    biquad: NodeId,
    values: [f64; 3],
}

impl FilterEffect {
    fn new(host: &mut dyn AudioGraphHost) -> Self {
        let biquad = host.create_node(NodeKind::Biquad);
        let values = [
            FILTER_PARAMS[0].default,
            FILTER_PARAMS[1].default,
            FILTER_PARAMS[2].default,
        ];
        let mut effect = Self {
            wd: WetDry::new(host, biquad, biquad),
            biquad,
            values,
        };
        effect.push_params(host);
        effect.wd.set_mix(host, 1.0, 0.0);
        effect
    }

    fn push_params(&self, host: &mut dyn AudioGraphHost) {
        host.set_param(self.biquad, "freq", self.values[0]);
        host.set_param(self.biquad, "q", self.values[1]);
        host.set_param(self.biquad, "mode", self.values[2]);
    }

    fn wet_entry(&self) -> NodeId {
        self.biquad
    }
    fn wet_exit(&self) -> NodeId {
        self.biquad
    }
}

impl Effect for FilterEffect {
    fn params(&self) -> &[ParamSpec] {
        &FILTER_PARAMS
    }

    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64) {
        let idx = match id {
            "cutoff_hz" => 0,
            "resonance" => 1,
            "mode" => 2,
            _ => return,
        };
        self.values[idx] = FILTER_PARAMS[idx].clamp(value);
        self.push_params(host);
    }

    fn get_parameter(&self, id: &str) -> f64 {
        match id {
            "cutoff_hz" => self.values[0],
            "resonance" => self.values[1],
            "mode" => self.values[2],
            _ => 0.0,
        }
    }

    impl_common_effect_methods!();

    fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        self.wd.dispose(host);
        host.dispose(self.biquad);
    }

    fn kind_name(&self) -> &'static str {
        "filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    #[test]
    fn reverb_clamps_wet_level() {
        let mut host = SimulatedHost::new(48_000.0);
        let mut reverb = ReverbEffect::new(&mut host);
        reverb.set_parameter(&mut host, "wet_level", 5.0);
        assert_eq!(reverb.get_parameter("wet_level"), 1.0);
        reverb.set_parameter(&mut host, "wet_level", -5.0);
        assert_eq!(reverb.get_parameter("wet_level"), 0.0);
    }

    #[test]
    fn bypass_disconnects_wet_leg() {
        let mut host = SimulatedHost::new(48_000.0);
        let mut delay = DelayEffect::new(&mut host);
        assert!(host.is_connected(delay.input_node(), delay.delay_node));
        delay.set_enabled(&mut host, false);
        assert!(!delay.is_enabled());
        assert!(!host.is_connected(delay.input_node(), delay.delay_node));
        delay.set_enabled(&mut host, true);
        assert!(host.is_connected(delay.input_node(), delay.delay_node));
    }
}

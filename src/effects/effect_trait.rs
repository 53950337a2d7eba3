use crate::host::{AudioGraphHost, NodeId};

/// A single named parameter on an effect: its declared range and how it is
/// perceived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub curve: ParamCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamCurve {
    Linear,
    Logarithmic,
}

impl ParamSpec {
    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        value.clamp(lo, hi)
    }
}

/// Capability set of a wired effect: `{setParameter, enable/bypass, connect
/// input, connect output, dispose}`. An effect owns host node handles and
/// drives them through `AudioGraphHost` rather than owning sample buffers
/// or per-sample DSP math itself.
pub trait Effect: Send {
    /// Declared parameter list, in a stable order, for UI/serialization.
    fn params(&self) -> &[ParamSpec];

    /// Clamps to the declared range and applies to the node(s).
    fn set_parameter(&mut self, host: &mut dyn AudioGraphHost, id: &str, value: f64);
    fn get_parameter(&self, id: &str) -> f64;

    fn set_enabled(&mut self, host: &mut dyn AudioGraphHost, enabled: bool);
    fn is_enabled(&self) -> bool;

    /// Sets the wet/dry mix; effects that are not naturally wet/dry (e.g. a
    /// plain filter) treat `wet` as their only effective level.
    fn set_mix(&mut self, host: &mut dyn AudioGraphHost, wet: f64, dry: f64);

    /// The node signal enters at when the chain wires this effect in.
    fn input_node(&self) -> NodeId;
    /// The node signal leaves from when the chain wires this effect out.
    fn output_node(&self) -> NodeId;

    /// Tears down every host node this effect owns.
    fn dispose(&mut self, host: &mut dyn AudioGraphHost);

    fn kind_name(&self) -> &'static str;
}

pub mod chain;
pub mod effect_trait;
pub mod kind;

pub use chain::EffectChain;
pub use effect_trait::{Effect, ParamCurve, ParamSpec};
pub use kind::EffectKind;

use std::fmt;

/// The engine's error taxonomy.
///
/// `Configuration` and `Lifecycle` are returned synchronously from the
/// offending call. `RuntimeDsp` and `Scheduling` are never returned; they are
/// emitted as `EngineEvent::Error` on the event bus and the call that
/// triggered them otherwise succeeds, per the propagation rule in §7.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unknown track/effect/send id, unsupported effect type, or a
    /// structural id that was rejected outright (parameter values are
    /// clamped instead of rejected; see `Effect::set_parameter`).
    Configuration(String),
    /// The host audio runtime refused `resume`/`start`/`decode_audio_data`.
    RuntimeDsp(String),
    /// A scheduled callback raised while being dispatched by the
    /// `LookaheadScheduler`.
    Scheduling(String),
    /// An operation was attempted on an engine after `dispose()`.
    Lifecycle(String),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    pub fn runtime_dsp(msg: impl Into<String>) -> Self {
        EngineError::RuntimeDsp(msg.into())
    }

    pub fn scheduling(msg: impl Into<String>) -> Self {
        EngineError::Scheduling(msg.into())
    }

    pub fn lifecycle(msg: impl Into<String>) -> Self {
        EngineError::Lifecycle(msg.into())
    }

    /// Short category name, used when formatting `engine:error` events.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "configuration",
            EngineError::RuntimeDsp(_) => "runtime_dsp",
            EngineError::Scheduling(_) => "scheduling",
            EngineError::Lifecycle(_) => "lifecycle",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            EngineError::RuntimeDsp(msg) => write!(f, "runtime dsp error: {}", msg),
            EngineError::Scheduling(msg) => write!(f, "scheduling error: {}", msg),
            EngineError::Lifecycle(msg) => write!(f, "lifecycle error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

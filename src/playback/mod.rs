//! Adaptive-bitrate playback: engine/sink/gateway seams and the session
//! controller state machine.

pub mod controller;
pub mod engine;

pub use controller::{PlaybackController, PlaybackStatus};
pub use engine::{
    EngineError, EngineErrorKind, EngineEvent, EngineFactory, EngineSettings, HttpStreamGateway,
    MediaSink, SinkError, StreamEngine, StreamGateway,
};
